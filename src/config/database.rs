//! Configuración de base de datos
//!
//! Este módulo define los parámetros de conexión y del pool. El pool se
//! construye explícitamente a partir de esta configuración (inyección por
//! constructor, sin singletons de proceso).

use std::time::Duration;

/// Configuración de la base de datos y del pool de conexiones
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// URL estilo `sqlite://ruta/al/archivo.db` o ruta directa al archivo
    pub url: String,
    /// Tamaño máximo del pool (conexiones vivas, ociosas o prestadas)
    pub max_connections: usize,
    /// Conexiones abiertas por adelantado al crear el pool
    pub initial_connections: usize,
    /// Tiempo que una conexión espera el lock de escritura de SQLite
    pub busy_timeout: Duration,
    /// Intervalo de reintento cuando el pool está saturado
    pub acquire_retry_interval: Duration,
    /// Reintentos máximos antes de reportar el pool como agotado
    pub max_acquire_attempts: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://vehicle_rental.db".to_string()),
            max_connections: 10,
            initial_connections: 3,
            busy_timeout: Duration::from_secs(5),
            acquire_retry_interval: Duration::from_millis(100),
            max_acquire_attempts: 50,
        }
    }
}

impl DatabaseConfig {
    /// Configuración apuntando a una base de datos concreta
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Ruta del archivo SQLite, sin el prefijo de esquema
    pub fn database_path(&self) -> &str {
        self.url.strip_prefix("sqlite://").unwrap_or(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sqlite_scheme() {
        let config = DatabaseConfig::with_url("sqlite://fleet.db");
        assert_eq!(config.database_path(), "fleet.db");
    }

    #[test]
    fn plain_path_passes_through() {
        let config = DatabaseConfig::with_url("/tmp/fleet.db");
        assert_eq!(config.database_path(), "/tmp/fleet.db");
    }
}
