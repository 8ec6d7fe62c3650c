//! Motor transaccional de alquiler
//!
//! Cada operación pública que muta inventario es una unidad atómica:
//! adquirir conexión → BEGIN IMMEDIATE → validar sobre la fila bloqueada →
//! mutar → escribir en el libro → COMMIT. Cualquier error después del BEGIN
//! dispara un ROLLBACK antes de devolver la conexión al pool, así que nunca
//! queda visible una mutación a medias. Los sinks de recibos se notifican
//! recién después del commit y sus fallas no se propagan.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteConnection;
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::pool::ConnectionPool;
use crate::models::rental::{RentalRecord, RentalStatistics};
use crate::models::vehicle::{NewVehicle, Vehicle};
use crate::repositories::rental_repository::RentalRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::billing;
use crate::services::receipt::ReceiptSink;
use crate::utils::errors::AppError;
use crate::utils::validation;

/// Resultado de una devolución confirmada
#[derive(Debug, Clone)]
pub struct ReturnOutcome {
    pub record: RentalRecord,
    pub vehicle: Vehicle,
    pub days: i64,
    pub cost: Decimal,
}

pub struct RentalService {
    pool: Arc<ConnectionPool>,
    sinks: Vec<Arc<dyn ReceiptSink>>,
}

impl RentalService {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            sinks: Vec::new(),
        }
    }

    /// Registrar un observador post-commit (recibos, log de auditoría)
    pub fn add_sink(&mut self, sink: Arc<dyn ReceiptSink>) {
        self.sinks.push(sink);
    }

    // ------------------------------------------------------------------
    // Operaciones transaccionales
    // ------------------------------------------------------------------

    /// Alquilar una unidad del vehículo para `username`.
    ///
    /// Falla con `NotFound` si el vehículo no existe, `Conflict` si no hay
    /// unidades disponibles.
    pub async fn rent(&self, vehicle_id: i64, username: &str) -> Result<RentalRecord, AppError> {
        validation::validate_username(username)?;

        let mut conn = self.pool.acquire().await?;
        let result = rent_in_tx(&mut conn, vehicle_id, username).await;
        if result.is_err() {
            rollback(&mut conn).await;
        }
        self.pool.release(conn).await;

        let (vehicle, record) = result?;
        info!(
            "Vehículo {} ({}) alquilado por '{}'",
            vehicle_id, vehicle.model, username
        );
        for sink in &self.sinks {
            sink.on_rental_completed(username, &vehicle, record.rent_time);
        }
        Ok(record)
    }

    /// Devolver una unidad del vehículo.
    ///
    /// Cierra el alquiler abierto más antiguo (atribución FIFO), factura la
    /// duración y libera la unidad. `Conflict` si no hay nada alquilado.
    pub async fn return_vehicle(&self, vehicle_id: i64) -> Result<ReturnOutcome, AppError> {
        let mut conn = self.pool.acquire().await?;
        let result = return_in_tx(&mut conn, vehicle_id).await;
        if result.is_err() {
            rollback(&mut conn).await;
        }
        self.pool.release(conn).await;

        let outcome = result?;
        info!(
            "Vehículo {} devuelto por '{}': {} día(s), ${}",
            vehicle_id, outcome.record.username, outcome.days, outcome.cost
        );
        for sink in &self.sinks {
            sink.on_return_completed(
                &outcome.record.username,
                &outcome.vehicle,
                outcome.record.rent_time,
                outcome.record.return_time.unwrap_or_else(Utc::now),
                outcome.days,
                outcome.cost,
            );
        }
        Ok(outcome)
    }

    /// Dar de alta un vehículo con todas sus unidades disponibles
    pub async fn add_vehicle(&self, new: NewVehicle) -> Result<Vehicle, AppError> {
        validation::validate_new_vehicle(&new)?;

        let mut conn = self.pool.acquire().await?;
        let result = VehicleRepository::insert(&mut conn, &new).await;
        self.pool.release(conn).await;

        let vehicle = result?;
        info!(
            "Vehículo agregado: {} ({}, {} unidades)",
            vehicle.model, vehicle.vehicle_type, vehicle.quantity
        );
        Ok(vehicle)
    }

    /// Actualizar modelo, tipo y tarifa de un vehículo existente
    pub async fn update_vehicle(
        &self,
        vehicle_id: i64,
        model: &str,
        vehicle_type: &str,
        rent_per_day: Decimal,
    ) -> Result<Vehicle, AppError> {
        validation::validate_vehicle_details(model, vehicle_type, rent_per_day)?;

        let mut conn = self.pool.acquire().await?;
        let result =
            VehicleRepository::update_details(&mut conn, vehicle_id, model, vehicle_type, rent_per_day)
                .await;
        self.pool.release(conn).await;

        result?.ok_or_else(|| AppError::NotFound(format!("no vehicle with id {}", vehicle_id)))
    }

    /// Eliminar un vehículo de la flota.
    ///
    /// Falla cerrado con `Conflict` mientras exista algún alquiler abierto;
    /// el libro de alquileres cerrados se conserva (FK queda en NULL).
    pub async fn remove_vehicle(&self, vehicle_id: i64) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        let result = remove_in_tx(&mut conn, vehicle_id).await;
        if result.is_err() {
            rollback(&mut conn).await;
        }
        self.pool.release(conn).await;

        result?;
        info!("Vehículo {} eliminado de la flota", vehicle_id);
        Ok(())
    }

    /// Redimensionar la flota de un vehículo.
    ///
    /// Invariante de negocio: la nueva cantidad nunca puede quedar por debajo
    /// de las unidades actualmente alquiladas; la cuenta de alquiladas se
    /// preserva exacta (`available = nueva − alquiladas`).
    pub async fn resize_fleet(
        &self,
        vehicle_id: i64,
        new_quantity: i64,
    ) -> Result<Vehicle, AppError> {
        if new_quantity < 0 {
            return Err(AppError::Validation(
                "quantity cannot be negative".to_string(),
            ));
        }

        let mut conn = self.pool.acquire().await?;
        let result = resize_in_tx(&mut conn, vehicle_id, new_quantity).await;
        if result.is_err() {
            rollback(&mut conn).await;
        }
        self.pool.release(conn).await;

        let vehicle = result?;
        info!(
            "Flota del vehículo {} redimensionada a {} unidades ({} disponibles)",
            vehicle_id, vehicle.quantity, vehicle.available_quantity
        );
        Ok(vehicle)
    }

    // ------------------------------------------------------------------
    // Lecturas (snapshots, sin transacción explícita)
    // ------------------------------------------------------------------

    pub async fn get_all_vehicles(&self) -> Result<Vec<Vehicle>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let result = VehicleRepository::get_all(&mut conn).await;
        self.pool.release(conn).await;
        result
    }

    pub async fn get_available_vehicles(&self) -> Result<Vec<Vehicle>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let result = VehicleRepository::get_available(&mut conn).await;
        self.pool.release(conn).await;
        result
    }

    pub async fn get_vehicle(&self, vehicle_id: i64) -> Result<Option<Vehicle>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let result = VehicleRepository::get_by_id(&mut conn, vehicle_id).await;
        self.pool.release(conn).await;
        result
    }

    pub async fn user_rental_history(
        &self,
        username: &str,
    ) -> Result<Vec<RentalRecord>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let result = RentalRepository::history_for_user(&mut conn, username).await;
        self.pool.release(conn).await;
        result
    }

    pub async fn active_rentals(&self) -> Result<Vec<RentalRecord>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let result = RentalRepository::active_rentals(&mut conn).await;
        self.pool.release(conn).await;
        result
    }

    pub async fn is_vehicle_rented_by(
        &self,
        username: &str,
        vehicle_id: i64,
    ) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await?;
        let result = RentalRepository::is_rented_by(&mut conn, username, vehicle_id).await;
        self.pool.release(conn).await;
        result
    }

    /// Resumen agregado de la flota y los ingresos
    pub async fn rental_statistics(&self) -> Result<RentalStatistics, AppError> {
        let mut conn = self.pool.acquire().await?;
        let result = statistics(&mut conn).await;
        self.pool.release(conn).await;
        result
    }

    /// Cerrar los recursos del núcleo (delegado al pool, idempotente)
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

// ----------------------------------------------------------------------
// Cuerpos transaccionales: asumen conexión recién adquirida y dejan la
// transacción confirmada en el camino Ok; el llamador hace rollback en Err.
// ----------------------------------------------------------------------

async fn begin(conn: &mut SqliteConnection) -> Result<(), AppError> {
    // IMMEDIATE toma el lock de escritor ya, serializando a los mutadores
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
    Ok(())
}

async fn commit(conn: &mut SqliteConnection) -> Result<(), AppError> {
    sqlx::query("COMMIT").execute(&mut *conn).await?;
    Ok(())
}

async fn rollback(conn: &mut SqliteConnection) {
    if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
        warn!("Error al hacer rollback: {}", e);
    }
}

async fn rent_in_tx(
    conn: &mut SqliteConnection,
    vehicle_id: i64,
    username: &str,
) -> Result<(Vehicle, RentalRecord), AppError> {
    begin(conn).await?;

    let vehicle = VehicleRepository::lock_for_update(conn, vehicle_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no vehicle with id {}", vehicle_id)))?;

    if vehicle.available_quantity == 0 {
        return Err(AppError::Conflict(format!(
            "no units of vehicle {} available",
            vehicle_id
        )));
    }

    VehicleRepository::decrement_available(conn, vehicle_id).await?;
    let record = RentalRepository::insert(conn, vehicle_id, username, Utc::now()).await?;

    commit(conn).await?;

    let snapshot = Vehicle {
        available_quantity: vehicle.available_quantity - 1,
        ..vehicle
    };
    Ok((snapshot, record))
}

async fn return_in_tx(
    conn: &mut SqliteConnection,
    vehicle_id: i64,
) -> Result<ReturnOutcome, AppError> {
    begin(conn).await?;

    let vehicle = VehicleRepository::lock_for_update(conn, vehicle_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no vehicle with id {}", vehicle_id)))?;

    // Nada alquilado: no hay qué devolver y nunca se pasa del total
    if vehicle.available_quantity >= vehicle.quantity {
        return Err(AppError::Conflict(format!(
            "vehicle {} has no open rental",
            vehicle_id
        )));
    }

    let open = RentalRepository::find_oldest_open(conn, vehicle_id)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("vehicle {} has no open ledger entry", vehicle_id))
        })?;

    let return_time = Utc::now();
    let (days, cost) = billing::rental_charge(open.rent_time, return_time, vehicle.rent_per_day);

    RentalRepository::close(conn, open.id, return_time, cost).await?;
    VehicleRepository::increment_available(conn, vehicle_id).await?;

    commit(conn).await?;

    let snapshot = Vehicle {
        available_quantity: vehicle.available_quantity + 1,
        ..vehicle
    };
    let record = RentalRecord {
        return_time: Some(return_time),
        total_cost: Some(cost),
        ..open
    };
    Ok(ReturnOutcome {
        record,
        vehicle: snapshot,
        days,
        cost,
    })
}

async fn remove_in_tx(conn: &mut SqliteConnection, vehicle_id: i64) -> Result<(), AppError> {
    begin(conn).await?;

    VehicleRepository::lock_for_update(conn, vehicle_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no vehicle with id {}", vehicle_id)))?;

    let open = RentalRepository::count_open(conn, vehicle_id).await?;
    if open > 0 {
        return Err(AppError::Conflict(format!(
            "cannot remove vehicle {} with {} active rental(s)",
            vehicle_id, open
        )));
    }

    VehicleRepository::delete(conn, vehicle_id).await?;
    commit(conn).await
}

async fn resize_in_tx(
    conn: &mut SqliteConnection,
    vehicle_id: i64,
    new_quantity: i64,
) -> Result<Vehicle, AppError> {
    begin(conn).await?;

    let vehicle = VehicleRepository::lock_for_update(conn, vehicle_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no vehicle with id {}", vehicle_id)))?;

    let rented = vehicle.rented();
    if new_quantity < rented {
        return Err(AppError::Conflict(format!(
            "cannot shrink vehicle {} below {} rented unit(s)",
            vehicle_id, rented
        )));
    }

    VehicleRepository::resize(conn, vehicle_id, new_quantity, rented).await?;
    commit(conn).await?;

    Ok(Vehicle {
        quantity: new_quantity,
        available_quantity: new_quantity - rented,
        ..vehicle
    })
}

async fn statistics(conn: &mut SqliteConnection) -> Result<RentalStatistics, AppError> {
    let total_vehicles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vehicles")
        .fetch_one(&mut *conn)
        .await?;
    let available_vehicles: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM vehicles WHERE available_quantity > 0")
            .fetch_one(&mut *conn)
            .await?;
    let active_rentals = RentalRepository::count_all_open(conn).await?;
    let total_revenue = RentalRepository::total_revenue(conn).await?;

    Ok(RentalStatistics {
        total_vehicles,
        available_vehicles,
        active_rentals,
        total_revenue,
    })
}
