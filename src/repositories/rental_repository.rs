//! Repositorio del libro de alquileres
//!
//! Acceso puro a la tabla `rental_ledger`. Igual que el repositorio de
//! vehículos, opera sobre una conexión ya abierta y no conoce transacciones.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteConnection;
use std::str::FromStr;

use crate::models::rental::RentalRecord;
use crate::utils::errors::AppError;

pub struct RentalRepository;

impl RentalRepository {
    /// Abrir una entrada del libro: alquiler sin devolución ni costo todavía
    pub async fn insert(
        conn: &mut SqliteConnection,
        vehicle_id: i64,
        username: &str,
        rent_time: DateTime<Utc>,
    ) -> Result<RentalRecord, AppError> {
        let record = sqlx::query_as::<_, RentalRecord>(
            "INSERT INTO rental_ledger (vehicle_id, username, rent_time) \
             VALUES (?1, ?2, ?3) \
             RETURNING id, vehicle_id, username, rent_time, return_time, total_cost",
        )
        .bind(vehicle_id)
        .bind(username)
        .bind(rent_time)
        .fetch_one(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Alquiler abierto más antiguo de un vehículo (atribución FIFO: el que
    /// se devuelve es siempre el que lleva más tiempo alquilado).
    pub async fn find_oldest_open(
        conn: &mut SqliteConnection,
        vehicle_id: i64,
    ) -> Result<Option<RentalRecord>, AppError> {
        let record = sqlx::query_as::<_, RentalRecord>(
            "SELECT id, vehicle_id, username, rent_time, return_time, total_cost \
             FROM rental_ledger \
             WHERE vehicle_id = ?1 AND return_time IS NULL \
             ORDER BY rent_time ASC, id ASC LIMIT 1",
        )
        .bind(vehicle_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Cerrar una entrada: fija la fecha de devolución y el costo facturado
    pub async fn close(
        conn: &mut SqliteConnection,
        rental_id: i64,
        return_time: DateTime<Utc>,
        total_cost: Decimal,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE rental_ledger SET return_time = ?2, total_cost = ?3 WHERE id = ?1")
            .bind(rental_id)
            .bind(return_time)
            .bind(total_cost.to_string())
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Alquileres abiertos de un vehículo
    pub async fn count_open(
        conn: &mut SqliteConnection,
        vehicle_id: i64,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rental_ledger WHERE vehicle_id = ?1 AND return_time IS NULL",
        )
        .bind(vehicle_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }

    pub async fn count_all_open(conn: &mut SqliteConnection) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM rental_ledger WHERE return_time IS NULL")
                .fetch_one(&mut *conn)
                .await?;

        Ok(count)
    }

    /// Historial completo de un usuario, lo más reciente primero
    pub async fn history_for_user(
        conn: &mut SqliteConnection,
        username: &str,
    ) -> Result<Vec<RentalRecord>, AppError> {
        let records = sqlx::query_as::<_, RentalRecord>(
            "SELECT r.id, r.vehicle_id, r.username, r.rent_time, r.return_time, r.total_cost, \
                    v.model, v.type \
             FROM rental_ledger r \
             LEFT JOIN vehicles v ON r.vehicle_id = v.id \
             WHERE r.username = ?1 ORDER BY r.rent_time DESC",
        )
        .bind(username)
        .fetch_all(&mut *conn)
        .await?;

        Ok(records)
    }

    /// Todos los alquileres abiertos, el más antiguo primero
    pub async fn active_rentals(
        conn: &mut SqliteConnection,
    ) -> Result<Vec<RentalRecord>, AppError> {
        let records = sqlx::query_as::<_, RentalRecord>(
            "SELECT r.id, r.vehicle_id, r.username, r.rent_time, r.return_time, r.total_cost, \
                    v.model, v.type \
             FROM rental_ledger r \
             LEFT JOIN vehicles v ON r.vehicle_id = v.id \
             WHERE r.return_time IS NULL ORDER BY r.rent_time ASC",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(records)
    }

    /// ¿Tiene este usuario un alquiler abierto de este vehículo?
    pub async fn is_rented_by(
        conn: &mut SqliteConnection,
        username: &str,
        vehicle_id: i64,
    ) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rental_ledger \
             WHERE vehicle_id = ?1 AND username = ?2 AND return_time IS NULL",
        )
        .bind(vehicle_id)
        .bind(username)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count > 0)
    }

    /// Ingresos totales de los alquileres cerrados. El costo vive como TEXT
    /// (Decimal exacto), así que la suma se hace en Rust y no en SQL.
    pub async fn total_revenue(conn: &mut SqliteConnection) -> Result<Decimal, AppError> {
        let costs: Vec<String> = sqlx::query_scalar(
            "SELECT total_cost FROM rental_ledger \
             WHERE return_time IS NOT NULL AND total_cost IS NOT NULL",
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut revenue = Decimal::ZERO;
        for raw in costs {
            let cost = Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
                index: "total_cost".to_string(),
                source: Box::new(e),
            })?;
            revenue += cost;
        }

        Ok(revenue)
    }
}
