//! Núcleo transaccional del sistema de alquiler de vehículos
//!
//! Esta librería contiene el motor de inventario y transacciones: el pool de
//! conexiones, la capa de acceso a datos sobre SQLite y el servicio de
//! alquiler/devolución que mantiene el inventario consistente bajo acceso
//! concurrente. La capa visual (login, paneles de administración, tablas)
//! vive en el proceso que consume esta librería.

pub mod config;
pub mod database;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

pub use config::database::DatabaseConfig;
pub use database::pool::ConnectionPool;
pub use models::rental::{RentalRecord, RentalStatistics};
pub use models::session::{SessionContext, UserRole, UserSession};
pub use models::vehicle::{NewVehicle, Vehicle};
pub use services::receipt::{FileReceiptSink, ReceiptSink};
pub use services::rental_service::{RentalService, ReturnOutcome};
pub use utils::errors::AppError;
