//! Application configuration
//!
//! Configuration is layered (lowest to highest priority):
//! 1. Built-in defaults
//! 2. JSON config file (`ingest.json` in the working directory, or `--config`)
//! 3. CLI arguments with environment variable fallbacks

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{
    CONFIG_FILE_NAME, CORS_ANY_ORIGIN, DEFAULT_ENVIRONMENT, DEFAULT_HOST, DEFAULT_MAX_BATCH_SIZE,
    DEFAULT_MAX_REQUEST_SIZE_MB, DEFAULT_PORT, DEFAULT_RATE_LIMIT_BURST, DEFAULT_RATE_LIMIT_RPM,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SQLITE_PATH, POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS,
    POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS, POSTGRES_DEFAULT_MAX_CONNECTIONS,
    POSTGRES_DEFAULT_MAX_LIFETIME_SECS, POSTGRES_DEFAULT_MIN_CONNECTIONS,
    POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
};

// =============================================================================
// Database Backend Enum (SQLite or PostgreSQL)
// =============================================================================

/// Relational backend holding logs and API keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Sqlite,
    Postgres,
}

impl fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseBackend::Sqlite => write!(f, "sqlite"),
            DatabaseBackend::Postgres => write!(f, "postgres"),
        }
    }
}

// =============================================================================
// File Config Structs (deserialized from JSON)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub environment: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_request_size_mb: Option<usize>,
}

/// CORS configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CorsFileConfig {
    pub enabled: Option<bool>,
    pub allowed_origins: Option<Vec<String>>,
}

/// SQLite configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SqliteFileConfig {
    pub path: Option<PathBuf>,
}

/// PostgreSQL configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostgresFileConfig {
    /// PostgreSQL connection URL (or use INGEST_POSTGRES_URL env var)
    pub url: Option<String>,
    /// Maximum number of connections in the pool (default: 100)
    pub max_connections: Option<u32>,
    /// Minimum number of connections to keep warm (default: 10)
    pub min_connections: Option<u32>,
    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: Option<u64>,
    /// Idle connection timeout in seconds (default: 600)
    pub idle_timeout_secs: Option<u64>,
    /// Max connection lifetime in seconds (default: 3600)
    pub max_lifetime_secs: Option<u64>,
    /// Statement timeout in seconds, 0 to disable (default: 60)
    pub statement_timeout_secs: Option<u64>,
}

/// Database configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    pub backend: Option<DatabaseBackend>,
    pub sqlite: Option<SqliteFileConfig>,
    pub postgres: Option<PostgresFileConfig>,
}

/// Authentication configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthFileConfig {
    pub api_keys: Option<Vec<String>>,
    pub api_key_secret: Option<String>,
}

/// Rate limit configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RateLimitFileConfig {
    pub enabled: Option<bool>,
    pub requests_per_minute: Option<u32>,
    pub burst: Option<u32>,
    pub per_ip: Option<bool>,
}

/// Ingestion configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct IngestFileConfig {
    pub max_batch_size: Option<usize>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub cors: Option<CorsFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    pub auth: Option<AuthFileConfig>,
    pub rate_limit: Option<RateLimitFileConfig>,
    pub ingest: Option<IngestFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub request_timeout_secs: u64,
    pub max_request_size_mb: usize,
}

impl ServerConfig {
    pub fn body_limit_bytes(&self) -> usize {
        self.max_request_size_mb.saturating_mul(1024 * 1024)
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// True when any origin is accepted
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == CORS_ANY_ORIGIN)
    }
}

/// PostgreSQL configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to keep warm
    pub min_connections: u32,
    /// Connection acquire timeout in seconds
    pub acquire_timeout_secs: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,
    /// Max connection lifetime in seconds
    pub max_lifetime_secs: u64,
    /// Statement timeout in seconds (0 = disabled)
    pub statement_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub sqlite_path: PathBuf,
    /// Present only when a PostgreSQL URL is configured
    pub postgres: Option<PostgresConfig>,
}

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub api_keys: Vec<String>,
    pub api_key_secret: Option<String>,
}

// Raw keys and the secret never reach the logs
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_keys", &format_args!("[{} redacted]", self.api_keys.len()))
            .field("api_key_secret", &self.api_key_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Rate limit configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests_per_minute: u32,
    pub burst: u32,
    pub per_ip: bool,
}

/// Ingestion configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub max_batch_size: usize,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub ingest: IngestConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Local directory config OR CLI-specified config path
    /// 3. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let file_path = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        let file_config = match file_path {
            Some(path) => {
                let config = FileConfig::load_from_file(&path)?;
                config.warn_unknown_fields();
                config
            }
            None => FileConfig::default(),
        };

        Ok(Self::from_sources(cli, file_config))
    }

    /// Layer defaults, file config and CLI/env overrides
    fn from_sources(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_cors = file_config.cors.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();
        let file_sqlite = file_database.sqlite.unwrap_or_default();
        let file_postgres = file_database.postgres.unwrap_or_default();
        let file_auth = file_config.auth.unwrap_or_default();
        let file_rate_limit = file_config.rate_limit.unwrap_or_default();
        let file_ingest = file_config.ingest.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
            environment: cli
                .environment
                .clone()
                .or(file_server.environment)
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            request_timeout_secs: cli
                .request_timeout_secs
                .or(file_server.request_timeout_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_request_size_mb: cli
                .max_request_size_mb
                .or(file_server.max_request_size_mb)
                .unwrap_or(DEFAULT_MAX_REQUEST_SIZE_MB),
        };

        let cors = CorsConfig {
            enabled: cli.cors_enabled.or(file_cors.enabled).unwrap_or(true),
            allowed_origins: clean_list(
                cli.allowed_origins
                    .clone()
                    .or(file_cors.allowed_origins)
                    .unwrap_or_else(|| vec![CORS_ANY_ORIGIN.to_string()]),
            ),
        };

        let postgres_url = cli.postgres_url.clone().or(file_postgres.url);
        let postgres = postgres_url.map(|url| PostgresConfig {
            url,
            max_connections: file_postgres
                .max_connections
                .unwrap_or(POSTGRES_DEFAULT_MAX_CONNECTIONS),
            min_connections: file_postgres
                .min_connections
                .unwrap_or(POSTGRES_DEFAULT_MIN_CONNECTIONS),
            acquire_timeout_secs: file_postgres
                .acquire_timeout_secs
                .unwrap_or(POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS),
            idle_timeout_secs: file_postgres
                .idle_timeout_secs
                .unwrap_or(POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS),
            max_lifetime_secs: file_postgres
                .max_lifetime_secs
                .unwrap_or(POSTGRES_DEFAULT_MAX_LIFETIME_SECS),
            statement_timeout_secs: file_postgres
                .statement_timeout_secs
                .unwrap_or(POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS),
        });

        let database = DatabaseConfig {
            backend: cli
                .database_backend
                .or(file_database.backend)
                .unwrap_or_default(),
            sqlite_path: cli
                .sqlite_path
                .clone()
                .or(file_sqlite.path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
            postgres,
        };

        let auth = AuthConfig {
            api_keys: clean_list(
                cli.api_keys
                    .clone()
                    .or(file_auth.api_keys)
                    .unwrap_or_default(),
            ),
            api_key_secret: cli
                .api_key_secret
                .clone()
                .or(file_auth.api_key_secret)
                .filter(|s| !s.is_empty()),
        };

        let rate_limit = RateLimitConfig {
            enabled: cli
                .rate_limit_enabled
                .or(file_rate_limit.enabled)
                .unwrap_or(true),
            requests_per_minute: cli
                .rate_limit_rpm
                .or(file_rate_limit.requests_per_minute)
                .unwrap_or(DEFAULT_RATE_LIMIT_RPM),
            burst: cli
                .rate_limit_burst
                .or(file_rate_limit.burst)
                .unwrap_or(DEFAULT_RATE_LIMIT_BURST),
            per_ip: cli
                .rate_limit_per_ip
                .or(file_rate_limit.per_ip)
                .unwrap_or(false),
        };

        let ingest = IngestConfig {
            max_batch_size: cli
                .max_batch_size
                .or(file_ingest.max_batch_size)
                .unwrap_or(DEFAULT_MAX_BATCH_SIZE),
        };

        let config = Self {
            server,
            cors,
            database,
            auth,
            rate_limit,
            ingest,
        };
        tracing::trace!(config = ?config, "Final configuration");
        config
    }
}

/// Trim entries and drop empty ones (comma-separated env values often carry spaces)
fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
