//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};

use crate::api::ApiServer;
use crate::api::auth::ApiKeyAuthenticator;
use crate::api::routes::ServiceInfo;
use crate::core::cli::{self, CliConfig, Commands, KeyCommands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_API_KEYS, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::TransactionalService;
use crate::data::cache::RateLimiter;
use crate::utils::api_key::ApiKeyHasher;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub database: Arc<TransactionalService>,
    pub authenticator: Arc<ApiKeyAuthenticator>,
    pub rate_limiter: RateLimiter,
    pub info: Arc<ServiceInfo>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Keys { command }) => {
                Self::handle_key_command(&cli_config, command).await
            }
            Some(Commands::Serve) | None => {
                let app = Self::init(&cli_config).await?;
                Self::start_server(app).await
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        if config.auth.api_keys.is_empty() {
            anyhow::bail!(
                "No API keys configured. Set {} (comma-separated) or auth.api_keys in the config file",
                ENV_API_KEYS
            );
        }

        let database = Arc::new(
            TransactionalService::init(&config.database)
                .await
                .context("Failed to initialize database")?,
        );
        tracing::debug!(backend = %database.backend(), "Database initialized");

        let authenticator = Arc::new(Self::authenticator(&config, &database)?);
        let created = authenticator
            .bootstrap(&config.auth.api_keys)
            .await
            .context("Failed to register configured API keys")?;
        tracing::info!(
            configured = config.auth.api_keys.len(),
            created,
            "API keys ready"
        );

        let shutdown = ShutdownService::new(Arc::clone(&database));
        let info = Arc::new(ServiceInfo::new(config.server.environment.clone()));

        Ok(Self {
            shutdown,
            config,
            database,
            authenticator,
            rate_limiter: RateLimiter::new(),
            info,
        })
    }

    fn authenticator(
        config: &AppConfig,
        database: &TransactionalService,
    ) -> Result<ApiKeyAuthenticator> {
        let hasher = ApiKeyHasher::new(config.auth.api_key_secret.as_deref())
            .map_err(|e| anyhow::anyhow!("Invalid API key secret: {}", e))?;
        if !hasher.is_keyed() {
            tracing::warn!("No API key secret configured, hashing keys with plain SHA-256");
        }
        Ok(ApiKeyAuthenticator::new(database.repository(), hasher))
    }

    async fn handle_key_command(cli: &CliConfig, command: KeyCommands) -> Result<()> {
        let config = AppConfig::load(cli)?;
        let database = TransactionalService::init(&config.database)
            .await
            .context("Failed to initialize database")?;
        let authenticator = Self::authenticator(&config, &database)?;

        let result = match command {
            KeyCommands::Generate {
                name,
                expires_in_days,
            } => {
                let expires_at =
                    expires_in_days.map(|days| Utc::now() + Duration::days(i64::from(days)));
                authenticator
                    .generate(&name, expires_at)
                    .await
                    .map(|(raw_key, record)| {
                        println!("API key created. It will not be shown again.");
                        println!();
                        println!("  Name:    {}", record.name);
                        println!("  Key:     {}", raw_key);
                        println!("  Hash:    {}", record.key_hash);
                        if let Some(expires_at) = record.expires_at {
                            println!("  Expires: {}", expires_at.to_rfc3339());
                        }
                    })
                    .context("Failed to create API key")
            }
            KeyCommands::Revoke { key_hash } => authenticator
                .revoke(&key_hash)
                .await
                .context("Failed to revoke API key")
                .and_then(|found| {
                    if found {
                        println!("Revoked API key {}", key_hash);
                        Ok(())
                    } else {
                        anyhow::bail!("No API key with hash {}", key_hash)
                    }
                }),
        };

        database.close().await;
        result
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        app.start_background_tasks().await;

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }

    pub async fn start_background_tasks(&self) {
        self.shutdown
            .register(
                self.database
                    .start_checkpoint_task(self.shutdown.subscribe()),
            )
            .await;

        self.shutdown
            .register(
                self.authenticator
                    .start_refresh_task(self.shutdown.subscribe()),
            )
            .await;

        if self.config.rate_limit.enabled {
            self.shutdown
                .register(
                    self.rate_limiter
                        .start_sweep_task(self.shutdown.subscribe()),
                )
                .await;
        }

        tracing::debug!("Background tasks started");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::test_service;

    #[tokio::test]
    async fn test_background_tasks_stop_on_shutdown() {
        let mut config = AppConfig::load(&CliConfig::default()).unwrap();
        config.rate_limit.enabled = true;

        let database = Arc::new(TransactionalService::Sqlite(test_service().await));
        let authenticator = Arc::new(CoreApp::authenticator(&config, &database).unwrap());
        let app = CoreApp {
            shutdown: ShutdownService::new(Arc::clone(&database)),
            info: Arc::new(ServiceInfo::new("test")),
            config,
            database,
            authenticator,
            rate_limiter: RateLimiter::new(),
        };

        app.start_background_tasks().await;
        tokio::time::timeout(std::time::Duration::from_secs(5), app.shutdown.shutdown())
            .await
            .unwrap();
        assert!(app.shutdown.is_triggered());
    }
}
