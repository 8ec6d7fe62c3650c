//! Modelo del libro de alquileres
//!
//! Cada fila de `rental_ledger` registra un ciclo alquiler→devolución de una
//! unidad. Las filas nunca se borran: son la pista de auditoría. Una fila sin
//! `return_time` es un alquiler abierto.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::str::FromStr;

/// Entrada del libro de alquileres
///
/// `vehicle_id` es nullable: al eliminar un vehículo la referencia queda en
/// NULL (ON DELETE SET NULL) pero el historial se conserva. `vehicle_model`
/// y `vehicle_type` solo vienen informados en las lecturas con JOIN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalRecord {
    pub id: i64,
    pub vehicle_id: Option<i64>,
    pub username: String,
    pub rent_time: DateTime<Utc>,
    pub return_time: Option<DateTime<Utc>>,
    pub total_cost: Option<Decimal>,
    pub vehicle_model: Option<String>,
    pub vehicle_type: Option<String>,
}

impl RentalRecord {
    /// Un alquiler sin devolución registrada sigue abierto
    pub fn is_active(&self) -> bool {
        self.return_time.is_none()
    }

    /// Días facturados entre alquiler y devolución; None si sigue abierto
    pub fn duration_days(&self) -> Option<i64> {
        self.return_time
            .map(|returned| crate::services::billing::rental_days(self.rent_time, returned))
    }
}

impl FromRow<'_, SqliteRow> for RentalRecord {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let cost: Option<String> = row.try_get("total_cost")?;
        let total_cost = match cost {
            Some(raw) => Some(Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
                index: "total_cost".to_string(),
                source: Box::new(e),
            })?),
            None => None,
        };

        Ok(Self {
            id: row.try_get("id")?,
            vehicle_id: row.try_get("vehicle_id")?,
            username: row.try_get("username")?,
            rent_time: row.try_get("rent_time")?,
            return_time: row.try_get("return_time")?,
            total_cost,
            // Solo presentes en las consultas con JOIN a vehicles
            vehicle_model: row.try_get("model").ok(),
            vehicle_type: row.try_get("type").ok(),
        })
    }
}

/// Resumen agregado del estado de la flota
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalStatistics {
    pub total_vehicles: i64,
    pub available_vehicles: i64,
    pub active_rentals: i64,
    pub total_revenue: Decimal,
}

impl RentalStatistics {
    pub fn rented_vehicles(&self) -> i64 {
        self.total_vehicles - self.available_vehicles
    }

    pub fn rented_percentage(&self) -> f64 {
        if self.total_vehicles == 0 {
            0.0
        } else {
            self.rented_vehicles() as f64 / self.total_vehicles as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_handles_empty_fleet() {
        let stats = RentalStatistics {
            total_vehicles: 0,
            available_vehicles: 0,
            active_rentals: 0,
            total_revenue: Decimal::ZERO,
        };
        assert_eq!(stats.rented_percentage(), 0.0);
    }

    #[test]
    fn rented_vehicles_is_derived() {
        let stats = RentalStatistics {
            total_vehicles: 4,
            available_vehicles: 3,
            active_rentals: 2,
            total_revenue: Decimal::from(100),
        };
        assert_eq!(stats.rented_vehicles(), 1);
        assert_eq!(stats.rented_percentage(), 25.0);
    }
}
