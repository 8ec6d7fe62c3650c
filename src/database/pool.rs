//! Pool de conexiones a SQLite
//!
//! Administra un conjunto acotado de conexiones vivas: entrega conexiones
//! validadas, las recupera al liberarse y bloquea con reintento acotado
//! cuando está saturado. Se construye explícitamente desde `DatabaseConfig`
//! y se inyecta donde haga falta; no hay singleton de proceso.

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
use sqlx::Connection;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::database::DatabaseConfig;
use crate::database::schema;
use crate::utils::errors::AppError;

struct PoolState {
    idle: Vec<SqliteConnection>,
    /// Conexiones vivas: ociosas más las prestadas a llamadores
    live: usize,
    closed: bool,
}

/// Qué decidió `acquire` con el lock tomado
enum Checkout {
    Idle(SqliteConnection),
    OpenFresh,
    Wait,
}

pub struct ConnectionPool {
    config: DatabaseConfig,
    connect_options: SqliteConnectOptions,
    // El lock solo protege la manipulación del conjunto; las llamadas de I/O
    // (connect, ping, close) ocurren siempre fuera de la sección crítica.
    state: Mutex<PoolState>,
}

impl ConnectionPool {
    /// Crear el pool: abre la base (creándola si falta), ejecuta el bootstrap
    /// de esquema y deja pre-abiertas las conexiones iniciales.
    pub async fn new(config: DatabaseConfig) -> Result<Self, AppError> {
        let connect_options = SqliteConnectOptions::new()
            .filename(config.database_path())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout)
            .foreign_keys(true);

        let mut bootstrap = SqliteConnection::connect_with(&connect_options).await?;
        schema::initialize(&mut bootstrap).await?;

        let initial = config.initial_connections.clamp(1, config.max_connections.max(1));
        let mut idle = vec![bootstrap];
        while idle.len() < initial {
            idle.push(SqliteConnection::connect_with(&connect_options).await?);
        }

        info!(
            "Pool de conexiones listo: {} iniciales, máximo {}",
            idle.len(),
            config.max_connections
        );

        let live = idle.len();
        Ok(Self {
            config,
            connect_options,
            state: Mutex::new(PoolState {
                idle,
                live,
                closed: false,
            }),
        })
    }

    /// Obtener una conexión válida.
    ///
    /// Prefiere una ociosa (validada con un ping fuera del lock; si murió se
    /// descarta y se repone). Si no hay ociosas y el pool no llegó al máximo,
    /// abre una nueva. Saturado, reintenta con espera acotada y termina en
    /// `PoolExhausted` en lugar de esperar para siempre.
    pub async fn acquire(&self) -> Result<SqliteConnection, AppError> {
        let mut attempts: u32 = 0;

        loop {
            let checkout = {
                let mut state = self.state.lock().await;
                if state.closed {
                    return Err(AppError::PoolClosed);
                }
                if let Some(conn) = state.idle.pop() {
                    Checkout::Idle(conn)
                } else if state.live < self.config.max_connections {
                    state.live += 1;
                    Checkout::OpenFresh
                } else {
                    Checkout::Wait
                }
            };

            match checkout {
                Checkout::Idle(mut conn) => {
                    if conn.ping().await.is_ok() {
                        return Ok(conn);
                    }
                    debug!("Conexión ociosa muerta, se descarta y se abre otra");
                    let _ = conn.close().await;
                    let mut state = self.state.lock().await;
                    state.live -= 1;
                    // El próximo giro del loop abre una conexión fresca
                }
                Checkout::OpenFresh => {
                    match SqliteConnection::connect_with(&self.connect_options).await {
                        Ok(conn) => return Ok(conn),
                        Err(e) => {
                            let mut state = self.state.lock().await;
                            state.live -= 1;
                            return Err(AppError::Database(e));
                        }
                    }
                }
                Checkout::Wait => {
                    attempts += 1;
                    if attempts >= self.config.max_acquire_attempts {
                        return Err(AppError::PoolExhausted(format!(
                            "no connection freed after {} attempts",
                            attempts
                        )));
                    }
                    tokio::time::sleep(self.config.acquire_retry_interval).await;
                }
            }
        }
    }

    /// Devolver una conexión al pool.
    ///
    /// Si sigue viva se restablece el modo auto-commit con un ROLLBACK (su
    /// error "no transaction is active" se ignora) y vuelve al conjunto de
    /// ociosas; si murió se cierra y se descarta en silencio.
    pub async fn release(&self, mut conn: SqliteConnection) {
        if conn.ping().await.is_ok() {
            let _ = sqlx::query("ROLLBACK").execute(&mut conn).await;

            let mut state = self.state.lock().await;
            if !state.closed {
                state.idle.push(conn);
                return;
            }
            state.live -= 1;
            drop(state);
            let _ = conn.close().await;
        } else {
            debug!("Conexión devuelta en mal estado, se descarta");
            let mut state = self.state.lock().await;
            state.live -= 1;
            drop(state);
            let _ = conn.close().await;
        }
    }

    /// Cerrar todas las conexiones del pool. Idempotente; después de esto
    /// `acquire` falla con `PoolClosed`.
    pub async fn shutdown(&self) {
        let drained = {
            let mut state = self.state.lock().await;
            state.closed = true;
            state.live -= state.idle.len();
            std::mem::take(&mut state.idle)
        };

        for conn in drained {
            if let Err(e) = conn.close().await {
                warn!("Error cerrando conexión del pool: {}", e);
            }
        }
    }

    /// Conexiones vivas en este instante (para diagnóstico y tests)
    pub async fn live_connections(&self) -> usize {
        self.state.lock().await.live
    }
}
