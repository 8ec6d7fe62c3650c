//! Recibos y log de operaciones
//!
//! `ReceiptSink` es el contrato de notificación post-commit: el motor avisa
//! después de confirmar la transacción y cualquier falla del sink se registra
//! y no afecta la operación ya confirmada. `FileReceiptSink` escribe recibos
//! de texto y una línea en el log diario.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::models::vehicle::Vehicle;

/// Observador de alquileres y devoluciones confirmados.
///
/// Fire-and-forget: se invoca fuera de la transacción y no puede fallar ni
/// bloquear al llamador.
pub trait ReceiptSink: Send + Sync {
    fn on_rental_completed(&self, username: &str, vehicle: &Vehicle, rent_time: DateTime<Utc>);

    fn on_return_completed(
        &self,
        username: &str,
        vehicle: &Vehicle,
        rent_time: DateTime<Utc>,
        return_time: DateTime<Utc>,
        days: i64,
        cost: Decimal,
    );
}

/// Sink basado en archivos: recibos de texto en `receipts/` y un log diario
/// en `logs/rental_log_YYYY-MM-DD.log`.
pub struct FileReceiptSink {
    receipts_dir: PathBuf,
    logs_dir: PathBuf,
}

impl FileReceiptSink {
    /// Crea los directorios de recibos y logs bajo `base` si no existen
    pub fn new(base: impl AsRef<Path>) -> std::io::Result<Self> {
        let receipts_dir = base.as_ref().join("receipts");
        let logs_dir = base.as_ref().join("logs");
        fs::create_dir_all(&receipts_dir)?;
        fs::create_dir_all(&logs_dir)?;
        Ok(Self {
            receipts_dir,
            logs_dir,
        })
    }

    fn receipt_path(&self, username: &str, kind: &str, vehicle_id: i64, at: DateTime<Utc>) -> PathBuf {
        let stamp = at.format("%Y-%m-%d_%H-%M-%S");
        self.receipts_dir
            .join(format!("{}_{}_{}_{}.txt", username, kind, vehicle_id, stamp))
    }

    fn receipt_id(at: DateTime<Utc>) -> String {
        format!("{:08X}", at.timestamp_millis() as u32)
    }

    fn append_log(&self, at: DateTime<Utc>, line: &str) -> std::io::Result<()> {
        let path = self
            .logs_dir
            .join(format!("rental_log_{}.log", at.format("%Y-%m-%d")));
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)
    }

    fn write_rental_receipt(
        &self,
        username: &str,
        vehicle: &Vehicle,
        rent_time: DateTime<Utc>,
    ) -> std::io::Result<()> {
        let path = self.receipt_path(username, "rental", vehicle.id, rent_time);
        let body = format!(
            "=========================================\n\
             \x20         VEHICLE RENTAL RECEIPT         \n\
             =========================================\n\
             Receipt ID: {}\n\
             Date & Time: {}\n\
             -----------------------------------------\n\
             Customer: {}\n\
             -----------------------------------------\n\
             Vehicle Details:\n\
             \x20 ID: {}\n\
             \x20 Model: {}\n\
             \x20 Type: {}\n\
             \x20 Daily Rate: ${}\n\
             -----------------------------------------\n\
             Please return the vehicle in good condition.\n\
             Late fees may apply for delayed returns.\n\
             =========================================\n\
             Thank you for choosing our service!\n\
             =========================================\n",
            Self::receipt_id(rent_time),
            rent_time.format("%Y-%m-%d %H:%M:%S"),
            username,
            vehicle.id,
            vehicle.model,
            vehicle.vehicle_type,
            vehicle.rent_per_day,
        );
        fs::write(&path, body)?;
        debug!("Recibo de alquiler escrito en {}", path.display());
        Ok(())
    }

    fn write_return_receipt(
        &self,
        username: &str,
        vehicle: &Vehicle,
        rent_time: DateTime<Utc>,
        return_time: DateTime<Utc>,
        days: i64,
        cost: Decimal,
    ) -> std::io::Result<()> {
        let path = self.receipt_path(username, "return", vehicle.id, return_time);
        let hours = (return_time - rent_time).num_hours().max(0);
        let body = format!(
            "=========================================\n\
             \x20        VEHICLE RETURN RECEIPT          \n\
             =========================================\n\
             Receipt ID: {}\n\
             Return Date & Time: {}\n\
             -----------------------------------------\n\
             Customer: {}\n\
             -----------------------------------------\n\
             Vehicle Details:\n\
             \x20 ID: {}\n\
             \x20 Model: {}\n\
             \x20 Type: {}\n\
             -----------------------------------------\n\
             Rental Information:\n\
             \x20 Rental Date: {}\n\
             \x20 Return Date: {}\n\
             \x20 Duration: {} day(s) ({} hours)\n\
             -----------------------------------------\n\
             Financial Summary:\n\
             \x20 Daily Rate: ${}\n\
             \x20 Total Cost: ${}\n\
             -----------------------------------------\n\
             Thank you for returning the vehicle!\n\
             =========================================\n",
            Self::receipt_id(return_time),
            return_time.format("%Y-%m-%d %H:%M:%S"),
            username,
            vehicle.id,
            vehicle.model,
            vehicle.vehicle_type,
            rent_time.format("%Y-%m-%d %H:%M:%S"),
            return_time.format("%Y-%m-%d %H:%M:%S"),
            days,
            hours,
            vehicle.rent_per_day,
            cost,
        );
        fs::write(&path, body)?;
        debug!("Recibo de devolución escrito en {}", path.display());
        Ok(())
    }
}

impl ReceiptSink for FileReceiptSink {
    fn on_rental_completed(&self, username: &str, vehicle: &Vehicle, rent_time: DateTime<Utc>) {
        if let Err(e) = self.write_rental_receipt(username, vehicle, rent_time) {
            warn!("No se pudo escribir el recibo de alquiler: {}", e);
        }
        let line = format!(
            "[{}] RENTAL - User: {}, Vehicle ID: {}, Model: {}",
            rent_time.format("%Y-%m-%d %H:%M:%S"),
            username,
            vehicle.id,
            vehicle.model,
        );
        if let Err(e) = self.append_log(rent_time, &line) {
            warn!("No se pudo escribir el log de alquiler: {}", e);
        }
    }

    fn on_return_completed(
        &self,
        username: &str,
        vehicle: &Vehicle,
        rent_time: DateTime<Utc>,
        return_time: DateTime<Utc>,
        days: i64,
        cost: Decimal,
    ) {
        if let Err(e) =
            self.write_return_receipt(username, vehicle, rent_time, return_time, days, cost)
        {
            warn!("No se pudo escribir el recibo de devolución: {}", e);
        }
        let line = format!(
            "[{}] RETURN - User: {}, Vehicle ID: {}, Model: {}, Amount: ${}",
            return_time.format("%Y-%m-%d %H:%M:%S"),
            username,
            vehicle.id,
            vehicle.model,
            cost,
        );
        if let Err(e) = self.append_log(return_time, &line) {
            warn!("No se pudo escribir el log de devolución: {}", e);
        }
    }
}
