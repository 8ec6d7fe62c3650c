pub mod rental;
pub mod session;
pub mod vehicle;
