//! Data storage layer
//!
//! Provides database services for the application:
//! - `sqlite` - Embedded database (default)
//! - `postgres` - Shared database for multi-node deployments
//! - `filters` - Safe compilation of log filters into SQL
//! - `cache` - In-memory counters and rate limiting
//! - `types` - Shared data types across all backends
//! - `traits` - Repository traits for multi-database support
//! - `sql` - SQL dialects
//! - `error` - Unified error type for all backends
//!
//! ## Backend Support
//!
//! `LogRepository` and `ApiKeyRepository` are implemented by both SQLite and
//! PostgreSQL; `TransactionalService` picks one at startup.

pub mod cache;
pub mod error;
pub mod filters;
pub mod postgres;
pub mod sql;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use postgres::PostgresService;
pub use sqlite::SqliteService;

pub use error::DataError;

pub use traits::{ApiKeyRepository, LogRepository, TransactionalRepository};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::config::{DatabaseBackend, DatabaseConfig};
use crate::core::constants::DATABASE_PING_TIMEOUT_SECS;

/// Transactional database service enum
///
/// Wraps the underlying backend-specific service (SQLite or PostgreSQL).
/// Services are stored as Arc to enable safe extraction.
pub enum TransactionalService {
    /// SQLite backend (default, embedded)
    Sqlite(Arc<SqliteService>),
    /// PostgreSQL backend (for distributed deployments)
    Postgres(Arc<PostgresService>),
}

impl TransactionalService {
    /// Initialize the service selected by configuration
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DataError> {
        match config.backend {
            DatabaseBackend::Sqlite => {
                let service = SqliteService::init(&config.sqlite_path).await?;
                Ok(Self::Sqlite(Arc::new(service)))
            }
            DatabaseBackend::Postgres => {
                let postgres = config.postgres.as_ref().ok_or_else(|| {
                    DataError::Config("PostgreSQL configuration required".to_string())
                })?;
                let service = PostgresService::init(postgres).await?;
                Ok(Self::Postgres(Arc::new(service)))
            }
        }
    }

    /// Round-trip a trivial query, bounded by a timeout
    pub async fn ping(&self) -> Result<(), DataError> {
        let backend = self.backend_name();
        let probe = async {
            match self {
                Self::Sqlite(s) => s.ping().await.map_err(DataError::from),
                Self::Postgres(p) => p.ping().await.map_err(DataError::from),
            }
        };
        tokio::time::timeout(Duration::from_secs(DATABASE_PING_TIMEOUT_SECS), probe)
            .await
            .map_err(|_| DataError::timeout(backend, DATABASE_PING_TIMEOUT_SECS))?
    }

    /// Run a WAL checkpoint (SQLite) or equivalent maintenance task
    pub async fn checkpoint(&self) -> Result<(), DataError> {
        match self {
            Self::Sqlite(s) => s.checkpoint().await.map_err(Into::into),
            // PostgreSQL maintains itself via autovacuum
            Self::Postgres(_) => Ok(()),
        }
    }

    /// Close the database connection gracefully
    pub async fn close(&self) {
        match self {
            Self::Sqlite(s) => s.close().await,
            Self::Postgres(p) => p.close().await,
        }
    }

    /// Start the background checkpoint task (SQLite only)
    /// For PostgreSQL, starts a health check task instead.
    pub fn start_checkpoint_task(&self, shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        match self {
            Self::Sqlite(s) => s.start_checkpoint_task(shutdown_rx),
            Self::Postgres(p) => p.start_health_check_task(shutdown_rx),
        }
    }

    /// Get the backend type
    pub fn backend(&self) -> DatabaseBackend {
        match self {
            Self::Sqlite(_) => DatabaseBackend::Sqlite,
            Self::Postgres(_) => DatabaseBackend::Postgres,
        }
    }

    fn backend_name(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Backend-agnostic repository handle
    pub fn repository(&self) -> Arc<dyn TransactionalRepository> {
        match self {
            Self::Sqlite(s) => Arc::new(Arc::clone(s)),
            Self::Postgres(p) => Arc::new(Arc::clone(p)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{EventType, NewLog, Priority};
    use serde_json::json;

    #[tokio::test]
    async fn test_sqlite_service_through_enum() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            backend: DatabaseBackend::Sqlite,
            sqlite_path: dir.path().join("ingest.db"),
            postgres: None,
        };

        let service = TransactionalService::init(&config).await.unwrap();
        assert_eq!(service.backend(), DatabaseBackend::Sqlite);
        service.ping().await.unwrap();

        let repo = service.repository();
        let log = NewLog {
            event_id: "evt-1".to_string(),
            timestamp: chrono::Utc::now(),
            event_type: EventType::Telemetry,
            event_name: "boot".to_string(),
            properties: json!({}),
            user_id: None,
            session_id: None,
            app_version: Some("1.2.3".to_string()),
            device_info: json!({"os": "linux"}),
            sequence_number: Some(7),
            priority: Priority::High,
        };
        repo.insert_log(&log).await.unwrap();
        assert!(repo.insert_log(&log).await.unwrap_err().is_conflict());
        assert_eq!(repo.count_logs().await.unwrap(), 1);

        service.checkpoint().await.unwrap();
        service.close().await;
    }

    #[tokio::test]
    async fn test_postgres_without_config_fails() {
        let config = DatabaseConfig {
            backend: DatabaseBackend::Postgres,
            sqlite_path: "unused.db".into(),
            postgres: None,
        };
        let err = TransactionalService::init(&config).await.err().unwrap();
        assert!(matches!(err, DataError::Config(_)));
    }
}
