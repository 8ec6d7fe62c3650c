//! Repositorio de vehículos
//!
//! Acceso puro a la tabla `vehicles`. Todos los métodos reciben una conexión
//! ya abierta: el repositorio nunca adquiere la suya ni decide límites de
//! transacción; eso es responsabilidad del servicio que lo llama.

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteConnection;

use crate::models::vehicle::{NewVehicle, Vehicle};
use crate::utils::errors::AppError;

pub struct VehicleRepository;

impl VehicleRepository {
    pub async fn get_all(conn: &mut SqliteConnection) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT id, model, type, rent_per_day, quantity, available_quantity \
             FROM vehicles ORDER BY id",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(vehicles)
    }

    pub async fn get_available(conn: &mut SqliteConnection) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT id, model, type, rent_per_day, quantity, available_quantity \
             FROM vehicles WHERE available_quantity > 0 ORDER BY id",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(vehicles)
    }

    pub async fn get_by_id(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "SELECT id, model, type, rent_per_day, quantity, available_quantity \
             FROM vehicles WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(vehicle)
    }

    /// Leer la fila del vehículo dentro de una transacción IMMEDIATE ya
    /// abierta. SQLite no tiene `SELECT ... FOR UPDATE`: el lock de escritor
    /// lo sostiene la transacción entera, así que los mutadores concurrentes
    /// del mismo vehículo quedan serializados igualmente.
    pub async fn lock_for_update(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<Vehicle>, AppError> {
        Self::get_by_id(conn, id).await
    }

    /// Alta con todas las unidades disponibles
    pub async fn insert(
        conn: &mut SqliteConnection,
        new: &NewVehicle,
    ) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "INSERT INTO vehicles (model, type, rent_per_day, quantity, available_quantity) \
             VALUES (?1, ?2, ?3, ?4, ?4) \
             RETURNING id, model, type, rent_per_day, quantity, available_quantity",
        )
        .bind(&new.model)
        .bind(&new.vehicle_type)
        .bind(new.rent_per_day.to_string())
        .bind(new.quantity)
        .fetch_one(&mut *conn)
        .await?;

        Ok(vehicle)
    }

    /// Actualizar modelo, tipo y tarifa; None si el vehículo no existe
    pub async fn update_details(
        conn: &mut SqliteConnection,
        id: i64,
        model: &str,
        vehicle_type: &str,
        rent_per_day: Decimal,
    ) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET model = ?2, type = ?3, rent_per_day = ?4 WHERE id = ?1 \
             RETURNING id, model, type, rent_per_day, quantity, available_quantity",
        )
        .bind(id)
        .bind(model)
        .bind(vehicle_type)
        .bind(rent_per_day.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(vehicle)
    }

    /// Borrado directo; el guardado contra alquileres activos vive en el
    /// servicio, dentro de la misma transacción que este delete.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Redimensionar la flota preservando el número de unidades alquiladas
    pub async fn resize(
        conn: &mut SqliteConnection,
        id: i64,
        new_quantity: i64,
        rented: i64,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE vehicles SET quantity = ?2, available_quantity = ?3 WHERE id = ?1")
            .bind(id)
            .bind(new_quantity)
            .bind(new_quantity - rented)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    pub async fn decrement_available(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE vehicles SET available_quantity = available_quantity - 1 WHERE id = ?1",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn increment_available(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE vehicles SET available_quantity = available_quantity + 1 WHERE id = ?1",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
