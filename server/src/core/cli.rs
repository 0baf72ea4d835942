use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::DatabaseBackend;
use super::constants::{
    ENV_ALLOWED_ORIGINS, ENV_API_KEY_SECRET, ENV_API_KEYS, ENV_CONFIG, ENV_CORS_ENABLED,
    ENV_DATABASE_BACKEND, ENV_ENVIRONMENT, ENV_HOST, ENV_MAX_BATCH_SIZE, ENV_MAX_REQUEST_SIZE_MB,
    ENV_PORT, ENV_POSTGRES_URL, ENV_RATE_LIMIT_BURST, ENV_RATE_LIMIT_ENABLED,
    ENV_RATE_LIMIT_PER_IP, ENV_RATE_LIMIT_RPM, ENV_REQUEST_TIMEOUT_SECS, ENV_SQLITE_PATH,
};

#[derive(Parser)]
#[command(name = "ingest")]
#[command(version, about = "Analytics log ingestion server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Deployment label reported by the status endpoint
    #[arg(long, global = true, env = ENV_ENVIRONMENT)]
    pub environment: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = ENV_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: Option<u64>,

    /// Maximum request body size in megabytes
    #[arg(long, global = true, env = ENV_MAX_REQUEST_SIZE_MB)]
    pub max_request_size_mb: Option<usize>,

    /// Enable or disable CORS
    #[arg(long, global = true, env = ENV_CORS_ENABLED)]
    pub cors_enabled: Option<bool>,

    /// Comma-separated allowed origins ("*" allows any)
    #[arg(long, global = true, env = ENV_ALLOWED_ORIGINS, value_delimiter = ',')]
    pub allowed_origins: Option<Vec<String>>,

    // Database options
    /// Database backend (sqlite or postgres)
    #[arg(long, global = true, env = ENV_DATABASE_BACKEND, value_parser = parse_database_backend)]
    pub database_backend: Option<DatabaseBackend>,

    /// SQLite database file (when using sqlite backend)
    #[arg(long, global = true, env = ENV_SQLITE_PATH)]
    pub sqlite_path: Option<PathBuf>,

    /// PostgreSQL connection URL (when using postgres backend)
    #[arg(long, global = true, env = ENV_POSTGRES_URL)]
    pub postgres_url: Option<String>,

    // Auth options
    /// Comma-separated API keys bootstrapped at start-up
    #[arg(long, global = true, env = ENV_API_KEYS, value_delimiter = ',', hide_env_values = true)]
    pub api_keys: Option<Vec<String>>,

    /// Secret mixed into API key hashes (HMAC-SHA256)
    #[arg(long, global = true, env = ENV_API_KEY_SECRET, hide_env_values = true)]
    pub api_key_secret: Option<String>,

    // Rate limit options
    /// Enable or disable rate limiting
    #[arg(long, global = true, env = ENV_RATE_LIMIT_ENABLED)]
    pub rate_limit_enabled: Option<bool>,

    /// Requests per minute
    #[arg(long, global = true, env = ENV_RATE_LIMIT_RPM)]
    pub rate_limit_rpm: Option<u32>,

    /// Burst allowance above the per-minute rate
    #[arg(long, global = true, env = ENV_RATE_LIMIT_BURST)]
    pub rate_limit_burst: Option<u32>,

    /// Track limits per client IP instead of globally
    #[arg(long, global = true, env = ENV_RATE_LIMIT_PER_IP)]
    pub rate_limit_per_ip: Option<bool>,

    /// Maximum events per batch request
    #[arg(long, global = true, env = ENV_MAX_BATCH_SIZE)]
    pub max_batch_size: Option<usize>,
}

/// Parse database backend from CLI/env string
fn parse_database_backend(s: &str) -> Result<DatabaseBackend, String> {
    match s.to_lowercase().as_str() {
        "sqlite" => Ok(DatabaseBackend::Sqlite),
        "postgres" | "postgresql" => Ok(DatabaseBackend::Postgres),
        _ => Err(format!(
            "Invalid database backend '{}'. Valid options: sqlite, postgres",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Serve,
    /// API key administration
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum KeyCommands {
    /// Create a new API key and print it once
    Generate {
        /// Human-readable key name
        #[arg(long)]
        name: String,
        /// Expire the key after this many days
        #[arg(long)]
        expires_in_days: Option<u32>,
    },
    /// Deactivate an API key by its stored hash
    Revoke {
        /// Hex-encoded key hash
        key_hash: String,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub environment: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_request_size_mb: Option<usize>,
    pub cors_enabled: Option<bool>,
    pub allowed_origins: Option<Vec<String>>,
    pub database_backend: Option<DatabaseBackend>,
    pub sqlite_path: Option<PathBuf>,
    pub postgres_url: Option<String>,
    pub api_keys: Option<Vec<String>>,
    pub api_key_secret: Option<String>,
    pub rate_limit_enabled: Option<bool>,
    pub rate_limit_rpm: Option<u32>,
    pub rate_limit_burst: Option<u32>,
    pub rate_limit_per_ip: Option<bool>,
    pub max_batch_size: Option<usize>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        environment: cli.environment,
        request_timeout_secs: cli.request_timeout_secs,
        max_request_size_mb: cli.max_request_size_mb,
        cors_enabled: cli.cors_enabled,
        allowed_origins: cli.allowed_origins,
        database_backend: cli.database_backend,
        sqlite_path: cli.sqlite_path,
        postgres_url: cli.postgres_url,
        api_keys: cli.api_keys,
        api_key_secret: cli.api_key_secret,
        rate_limit_enabled: cli.rate_limit_enabled,
        rate_limit_rpm: cli.rate_limit_rpm,
        rate_limit_burst: cli.rate_limit_burst,
        rate_limit_per_ip: cli.rate_limit_per_ip,
        max_batch_size: cli.max_batch_size,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_database_backend() {
        assert_eq!(
            parse_database_backend("sqlite").unwrap(),
            DatabaseBackend::Sqlite
        );
        assert_eq!(
            parse_database_backend("PostgreSQL").unwrap(),
            DatabaseBackend::Postgres
        );
        let err = parse_database_backend("mysql").unwrap_err();
        assert!(err.contains("sqlite, postgres"));
    }

    #[test]
    fn test_cli_parses_keys_generate() {
        let cli = Cli::try_parse_from([
            "ingest",
            "keys",
            "generate",
            "--name",
            "mobile",
            "--expires-in-days",
            "30",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Keys {
                command:
                    KeyCommands::Generate {
                        name,
                        expires_in_days,
                    },
            }) => {
                assert_eq!(name, "mobile");
                assert_eq!(expires_in_days, Some(30));
            }
            _ => panic!("expected keys generate"),
        }
    }

    #[test]
    fn test_cli_splits_api_keys() {
        let cli = Cli::try_parse_from(["ingest", "--api-keys", "first-key,second-key"]).unwrap();
        assert_eq!(
            cli.api_keys,
            Some(vec!["first-key".to_string(), "second-key".to_string()])
        );
        assert!(cli.command.is_none());
    }
}
