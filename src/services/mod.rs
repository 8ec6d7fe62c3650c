pub mod billing;
pub mod receipt;
pub mod rental_service;
