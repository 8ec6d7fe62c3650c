//! Tests del pool de conexiones: saturación con espera acotada, reuso tras
//! release y shutdown idempotente.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use vehicle_rental::{AppError, ConnectionPool, DatabaseConfig};

fn test_config(dir: &TempDir) -> DatabaseConfig {
    let url = format!("sqlite://{}", dir.path().join("fleet.db").display());
    DatabaseConfig {
        max_connections: 2,
        initial_connections: 1,
        acquire_retry_interval: Duration::from_millis(10),
        max_acquire_attempts: 5,
        ..DatabaseConfig::with_url(url)
    }
}

#[tokio::test]
async fn acquire_beyond_max_reports_exhaustion() {
    let dir = TempDir::new().unwrap();
    let pool = ConnectionPool::new(test_config(&dir)).await.unwrap();

    let first = pool.acquire().await.unwrap();
    let second = pool.acquire().await.unwrap();

    // Pool saturado: el tercer acquire reintenta y termina en error explícito
    let third = pool.acquire().await;
    assert!(matches!(third, Err(AppError::PoolExhausted(_))));

    pool.release(first).await;
    let reused = pool.acquire().await;
    assert!(reused.is_ok());

    pool.release(reused.unwrap()).await;
    pool.release(second).await;
    pool.shutdown().await;
}

#[tokio::test]
async fn saturated_acquire_unblocks_when_a_connection_frees_up() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.max_connections = 1;
    config.max_acquire_attempts = 100;
    let pool = Arc::new(ConnectionPool::new(config).await.unwrap());

    let held = pool.acquire().await.unwrap();

    let waiter = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move {
            let conn = pool.acquire().await.unwrap();
            pool.release(conn).await;
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    pool.release(held).await;

    waiter.await.unwrap();
    pool.shutdown().await;
}

#[tokio::test]
async fn release_returns_connection_to_idle_set() {
    let dir = TempDir::new().unwrap();
    let pool = ConnectionPool::new(test_config(&dir)).await.unwrap();

    let before = pool.live_connections().await;
    for _ in 0..5 {
        let conn = pool.acquire().await.unwrap();
        pool.release(conn).await;
    }
    // Ciclos acquire/release sobre el mismo pool no abren conexiones de más
    assert_eq!(pool.live_connections().await, before);

    pool.shutdown().await;
}

#[tokio::test]
async fn shutdown_is_idempotent_and_closes_the_pool() {
    let dir = TempDir::new().unwrap();
    let pool = ConnectionPool::new(test_config(&dir)).await.unwrap();

    pool.shutdown().await;
    pool.shutdown().await;

    let result = pool.acquire().await;
    assert!(matches!(result, Err(AppError::PoolClosed)));
}

#[tokio::test]
async fn bootstrap_is_idempotent_across_pools() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let first = ConnectionPool::new(config.clone()).await.unwrap();
    first.shutdown().await;

    // Reabrir la misma base no vuelve a sembrar la flota
    let second = ConnectionPool::new(config).await.unwrap();
    let mut conn = second.acquire().await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vehicles")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(count, 4);

    second.release(conn).await;
    second.shutdown().await;
}
