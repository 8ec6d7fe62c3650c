//! Esquema y datos iniciales
//!
//! Bootstrap idempotente: crea las dos tablas si no existen y siembra la
//! flota por defecto la primera vez (tabla `vehicles` vacía). Se ejecuta una
//! sola vez al construir el pool, no es una preocupación de régimen.

use sqlx::sqlite::SqliteConnection;
use tracing::info;

use crate::utils::errors::AppError;

const CREATE_VEHICLES: &str = r#"
CREATE TABLE IF NOT EXISTS vehicles (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    model              TEXT NOT NULL,
    type               TEXT NOT NULL,
    rent_per_day       TEXT NOT NULL,
    quantity           INTEGER NOT NULL DEFAULT 1,
    available_quantity INTEGER NOT NULL DEFAULT 1
)
"#;

const CREATE_RENTAL_LEDGER: &str = r#"
CREATE TABLE IF NOT EXISTS rental_ledger (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    vehicle_id  INTEGER REFERENCES vehicles(id) ON DELETE SET NULL,
    username    TEXT NOT NULL,
    rent_time   TEXT NOT NULL,
    return_time TEXT,
    total_cost  TEXT
)
"#;

/// Flota sembrada en una base de datos nueva: (modelo, tipo, tarifa, unidades)
const SEED_FLEET: &[(&str, &str, &str, i64)] = &[
    ("Toyota Corolla", "Car", "50", 3),
    ("Honda Civic", "Car", "60", 2),
    ("Yamaha R15", "Bike", "30", 5),
    ("Suzuki Swift", "Car", "55", 2),
];

/// Crear tablas si faltan y sembrar la flota inicial si la base está vacía
pub async fn initialize(conn: &mut SqliteConnection) -> Result<(), AppError> {
    sqlx::query(CREATE_VEHICLES).execute(&mut *conn).await?;
    sqlx::query(CREATE_RENTAL_LEDGER).execute(&mut *conn).await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vehicles")
        .fetch_one(&mut *conn)
        .await?;

    if count == 0 {
        for (model, vehicle_type, rate, quantity) in SEED_FLEET {
            sqlx::query(
                "INSERT INTO vehicles (model, type, rent_per_day, quantity, available_quantity) \
                 VALUES (?1, ?2, ?3, ?4, ?4)",
            )
            .bind(model)
            .bind(vehicle_type)
            .bind(rate)
            .bind(quantity)
            .execute(&mut *conn)
            .await?;
        }
        info!("Base de datos nueva: flota inicial sembrada ({} modelos)", SEED_FLEET.len());
    }

    Ok(())
}
