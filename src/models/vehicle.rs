//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y el alta NewVehicle. Una fila de
//! `vehicles` representa un modelo de la flota con un contador de unidades,
//! no unidades individuales. Los valores devueltos son snapshots: no siguen
//! el estado de la base de datos después de la lectura.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::str::FromStr;

use crate::utils::errors::AppError;

/// Vehicle principal - mapea a la tabla `vehicles`
///
/// Invariante: `0 <= available_quantity <= quantity`. El motor de alquiler es
/// el único que muta estos contadores, siempre dentro de una transacción.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub model: String,
    pub vehicle_type: String,
    pub rent_per_day: Decimal,
    pub quantity: i64,
    pub available_quantity: i64,
}

impl Vehicle {
    /// Constructor canónico con chequeo de invariantes
    pub fn new(
        id: i64,
        model: String,
        vehicle_type: String,
        rent_per_day: Decimal,
        quantity: i64,
        available_quantity: i64,
    ) -> Result<Self, AppError> {
        if quantity < 0 {
            return Err(AppError::Validation(
                "quantity cannot be negative".to_string(),
            ));
        }
        if available_quantity < 0 || available_quantity > quantity {
            return Err(AppError::Validation(
                "available quantity must be between 0 and total quantity".to_string(),
            ));
        }
        if rent_per_day < Decimal::ZERO {
            return Err(AppError::Validation(
                "rent per day cannot be negative".to_string(),
            ));
        }
        Ok(Self {
            id,
            model,
            vehicle_type,
            rent_per_day,
            quantity,
            available_quantity,
        })
    }

    /// Unidades actualmente alquiladas
    pub fn rented(&self) -> i64 {
        self.quantity - self.available_quantity
    }

    pub fn is_available(&self) -> bool {
        self.available_quantity > 0
    }

    /// Estado legible para la tabla de la UI
    pub fn status(&self) -> String {
        if self.available_quantity == 0 {
            "Rented".to_string()
        } else if self.available_quantity == self.quantity {
            "Available".to_string()
        } else {
            format!("{}/{} Available", self.available_quantity, self.quantity)
        }
    }
}

// SQLx no mapea Decimal en SQLite, así que la tarifa se guarda como TEXT
// y se convierte a mano al leer la fila.
impl FromRow<'_, SqliteRow> for Vehicle {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let rate: String = row.try_get("rent_per_day")?;
        let rent_per_day = Decimal::from_str(&rate).map_err(|e| sqlx::Error::ColumnDecode {
            index: "rent_per_day".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            model: row.try_get("model")?,
            vehicle_type: row.try_get("type")?,
            rent_per_day,
            quantity: row.try_get("quantity")?,
            available_quantity: row.try_get("available_quantity")?,
        })
    }
}

/// Request para dar de alta un vehículo en la flota
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVehicle {
    pub model: String,
    pub vehicle_type: String,
    pub rent_per_day: Decimal,
    pub quantity: i64,
}
