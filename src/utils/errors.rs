//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del núcleo. La capa de UI
//! decide cómo presentarlos; aquí solo se distinguen las categorías:
//! validación (rechazado antes de abrir transacción), conflicto (rechazado
//! dentro de la transacción, con rollback limpio) e infraestructura.

use thiserror::Error;

/// Errores principales del núcleo de alquiler
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(String),

    #[error("Connection pool is shut down")]
    PoolClosed,
}

impl AppError {
    /// Conflictos de negocio detectados dentro de una transacción
    /// (vehículo sin unidades, nada que devolver, alquileres activos).
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}
