//! Tests de los sinks de recibos: notificación post-commit y tolerancia a
//! fallas de escritura (la operación confirmada nunca se ve afectada).

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;
use vehicle_rental::{
    ConnectionPool, DatabaseConfig, FileReceiptSink, NewVehicle, ReceiptSink, RentalService,
    Vehicle,
};

async fn setup() -> (TempDir, RentalService) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("fleet.db").display());
    let pool = Arc::new(
        ConnectionPool::new(DatabaseConfig::with_url(url))
            .await
            .unwrap(),
    );
    (dir, RentalService::new(pool))
}

fn new_vehicle(model: &str, quantity: i64) -> NewVehicle {
    NewVehicle {
        model: model.to_string(),
        vehicle_type: "Car".to_string(),
        rent_per_day: Decimal::from(50),
        quantity,
    }
}

#[derive(Default)]
struct RecordingSink {
    rentals: AtomicUsize,
    returns: AtomicUsize,
}

impl ReceiptSink for RecordingSink {
    fn on_rental_completed(&self, _username: &str, _vehicle: &Vehicle, _rent_time: DateTime<Utc>) {
        self.rentals.fetch_add(1, Ordering::SeqCst);
    }

    fn on_return_completed(
        &self,
        _username: &str,
        _vehicle: &Vehicle,
        _rent_time: DateTime<Utc>,
        _return_time: DateTime<Utc>,
        _days: i64,
        _cost: Decimal,
    ) {
        self.returns.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn sinks_fire_once_per_committed_operation() {
    let (_dir, mut service) = setup().await;
    let sink = Arc::new(RecordingSink::default());
    service.add_sink(sink.clone());

    let vehicle = service.add_vehicle(new_vehicle("Astra", 1)).await.unwrap();
    service.rent(vehicle.id, "alice").await.unwrap();
    service.return_vehicle(vehicle.id).await.unwrap();

    assert_eq!(sink.rentals.load(Ordering::SeqCst), 1);
    assert_eq!(sink.returns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sinks_are_not_notified_on_rejected_operations() {
    let (_dir, mut service) = setup().await;
    let sink = Arc::new(RecordingSink::default());
    service.add_sink(sink.clone());

    let vehicle = service.add_vehicle(new_vehicle("Uno", 1)).await.unwrap();

    // Devolución sin alquiler: no se confirma nada, no hay recibo
    service.return_vehicle(vehicle.id).await.unwrap_err();
    service.rent(vehicle.id, "alice").await.unwrap();
    service.rent(vehicle.id, "bob").await.unwrap_err();

    assert_eq!(sink.rentals.load(Ordering::SeqCst), 1);
    assert_eq!(sink.returns.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn file_sink_writes_receipts_and_daily_log() {
    let (dir, mut service) = setup().await;
    let base = dir.path().join("out");
    let sink = Arc::new(FileReceiptSink::new(&base).unwrap());
    service.add_sink(sink);

    let vehicle = service.add_vehicle(new_vehicle("206", 1)).await.unwrap();
    service.rent(vehicle.id, "alice").await.unwrap();
    service.return_vehicle(vehicle.id).await.unwrap();

    let receipts: Vec<_> = fs::read_dir(base.join("receipts"))
        .unwrap()
        .map(|entry| entry.unwrap())
        .collect();
    assert_eq!(receipts.len(), 2);

    let mut bodies = String::new();
    for entry in &receipts {
        bodies.push_str(&fs::read_to_string(entry.path()).unwrap());
    }
    assert!(bodies.contains("VEHICLE RENTAL RECEIPT"));
    assert!(bodies.contains("VEHICLE RETURN RECEIPT"));
    assert!(bodies.contains("Customer: alice"));
    assert!(bodies.contains("Model: 206"));
    assert!(bodies.contains("Total Cost: $50"));

    let logs: Vec<_> = fs::read_dir(base.join("logs"))
        .unwrap()
        .map(|entry| entry.unwrap())
        .collect();
    assert_eq!(logs.len(), 1);
    let log = fs::read_to_string(logs[0].path()).unwrap();
    assert!(log.contains("RENTAL - User: alice"));
    assert!(log.contains("RETURN - User: alice"));
}

#[tokio::test]
async fn sink_write_failure_does_not_fail_the_rental() {
    let (dir, mut service) = setup().await;
    let base = dir.path().join("broken");
    let sink = Arc::new(FileReceiptSink::new(&base).unwrap());
    service.add_sink(sink);

    // Romper el destino: donde iban los recibos ahora hay un archivo plano
    fs::remove_dir_all(base.join("receipts")).unwrap();
    fs::write(base.join("receipts"), b"not a directory").unwrap();

    let vehicle = service.add_vehicle(new_vehicle("Ka", 1)).await.unwrap();
    let record = service.rent(vehicle.id, "alice").await;
    assert!(record.is_ok());

    // El alquiler quedó confirmado a pesar del sink roto
    let after = service.get_vehicle(vehicle.id).await.unwrap().unwrap();
    assert_eq!(after.available_quantity, 0);
}
