//! PostgreSQL database service
//!
//! Shared backend for multi-node deployments:
//! - Connection pooling with min/max bounds
//! - Idle connection cleanup
//! - Connection lifetime cycling
//! - Statement timeout protection
//!
//! All schema definitions and migrations are managed here.

pub mod error;
mod migrations;
pub mod repositories;
mod repository_impl;
pub mod schema;

pub use error::PostgresError;
pub use sqlx::PgPool;

use std::sync::Arc;
use std::time::Duration;

use sqlx::ConnectOptions;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::log::LevelFilter;

use crate::core::config::PostgresConfig;
use crate::core::constants::{
    POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS, POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS,
    POSTGRES_DEFAULT_MAX_CONNECTIONS, POSTGRES_DEFAULT_MAX_LIFETIME_SECS,
    POSTGRES_DEFAULT_MIN_CONNECTIONS, POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
    POSTGRES_HEALTH_CHECK_INTERVAL_SECS,
};

/// PostgreSQL database service
///
/// Should be created once at server startup and shared across all modules.
pub struct PostgresService {
    pool: PgPool,
}

/// Pool settings with zero values replaced by defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PoolSettings {
    max_connections: u32,
    min_connections: u32,
    acquire_timeout_secs: u64,
    idle_timeout_secs: u64,
    max_lifetime_secs: u64,
    statement_timeout_secs: u64,
}

impl PoolSettings {
    fn from_config(config: &PostgresConfig) -> Self {
        fn or_default<T: PartialEq + Default>(value: T, default: T) -> T {
            if value == T::default() { default } else { value }
        }

        let max_connections = or_default(config.max_connections, POSTGRES_DEFAULT_MAX_CONNECTIONS);
        Self {
            max_connections,
            min_connections: or_default(config.min_connections, POSTGRES_DEFAULT_MIN_CONNECTIONS)
                .min(max_connections),
            acquire_timeout_secs: or_default(
                config.acquire_timeout_secs,
                POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS,
            ),
            idle_timeout_secs: or_default(
                config.idle_timeout_secs,
                POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS,
            ),
            max_lifetime_secs: or_default(
                config.max_lifetime_secs,
                POSTGRES_DEFAULT_MAX_LIFETIME_SECS,
            ),
            statement_timeout_secs: or_default(
                config.statement_timeout_secs,
                POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
            ),
        }
    }
}

impl PostgresService {
    /// Initialize the database service from configuration
    ///
    /// Connects the pool and runs pending migrations.
    pub async fn init(config: &PostgresConfig) -> Result<Self, PostgresError> {
        let url = config.url.as_str();
        if url.is_empty() {
            return Err(PostgresError::Config("PostgreSQL URL is required".into()));
        }

        let settings = PoolSettings::from_config(config);

        let mut options: PgConnectOptions = url
            .parse()
            .map_err(|e| PostgresError::Config(format!("Invalid PostgreSQL URL: {}", e)))?;

        options = options
            .log_statements(LevelFilter::Trace)
            .options([(
                "statement_timeout",
                format!("{}s", settings.statement_timeout_secs),
            )]);

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(settings.max_lifetime_secs))
            .connect_with(options)
            .await?;

        migrations::run_migrations(&pool).await?;

        tracing::debug!(
            max_connections = settings.max_connections,
            min_connections = settings.min_connections,
            acquire_timeout_secs = settings.acquire_timeout_secs,
            idle_timeout_secs = settings.idle_timeout_secs,
            max_lifetime_secs = settings.max_lifetime_secs,
            statement_timeout_secs = settings.statement_timeout_secs,
            "PostgresService initialized"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Liveness probe
    pub async fn ping(&self) -> Result<(), PostgresError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("PostgreSQL pool closed");
    }

    /// Periodic connectivity check
    pub fn start_health_check_task(
        self: &Arc<Self>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let db = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(POSTGRES_HEALTH_CHECK_INTERVAL_SECS));
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("PostgreSQL health check task shutting down");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        if let Err(e) = db.ping().await {
                            tracing::warn!("PostgreSQL health check failed: {}", e);
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    // Query tests require a running PostgreSQL instance; pool settings are
    // checked here.
    use super::*;

    fn config() -> PostgresConfig {
        PostgresConfig {
            url: "postgres://localhost/ingest".to_string(),
            max_connections: 0,
            min_connections: 0,
            acquire_timeout_secs: 0,
            idle_timeout_secs: 0,
            max_lifetime_secs: 0,
            statement_timeout_secs: 0,
        }
    }

    #[test]
    fn test_zero_values_use_defaults() {
        let settings = PoolSettings::from_config(&config());
        assert_eq!(settings.max_connections, POSTGRES_DEFAULT_MAX_CONNECTIONS);
        assert_eq!(settings.min_connections, POSTGRES_DEFAULT_MIN_CONNECTIONS);
        assert_eq!(
            settings.statement_timeout_secs,
            POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS
        );
    }

    #[test]
    fn test_min_connections_capped_by_max() {
        let settings = PoolSettings::from_config(&PostgresConfig {
            max_connections: 4,
            min_connections: 8,
            ..config()
        });
        assert_eq!(settings.max_connections, 4);
        assert_eq!(settings.min_connections, 4);
    }

    #[tokio::test]
    async fn test_empty_url_is_config_error() {
        let err = PostgresService::init(&PostgresConfig {
            url: String::new(),
            ..config()
        })
        .await
        .err()
        .unwrap();
        assert!(matches!(err, PostgresError::Config(_)));
    }
}
