// =============================================================================
// Application Identity
// =============================================================================

/// Service name reported by status endpoints
pub const APP_NAME: &str = "log-ingestion-server";

/// Crate name used for the default log filter
pub const APP_NAME_LOWER: &str = "ingest_server";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "ingest.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "INGEST_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "INGEST_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "INGEST_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "INGEST_LOG";

/// Environment variable for the deployment label
pub const ENV_ENVIRONMENT: &str = "INGEST_ENVIRONMENT";

/// Environment variable for the request timeout in seconds
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "INGEST_REQUEST_TIMEOUT_SECS";

/// Environment variable for the request body limit in megabytes
pub const ENV_MAX_REQUEST_SIZE_MB: &str = "INGEST_MAX_REQUEST_SIZE_MB";

/// Environment variable to enable or disable CORS
pub const ENV_CORS_ENABLED: &str = "INGEST_CORS_ENABLED";

/// Environment variable for comma-separated allowed origins
pub const ENV_ALLOWED_ORIGINS: &str = "INGEST_ALLOWED_ORIGINS";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_PORT: u16 = 8080;

/// Default deployment label
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default request body limit
pub const DEFAULT_MAX_REQUEST_SIZE_MB: usize = 10;

/// Wildcard origin
pub const CORS_ANY_ORIGIN: &str = "*";

/// Request id header name
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// Environment Variables - Database
// =============================================================================

/// Environment variable for the database backend (sqlite or postgres)
pub const ENV_DATABASE_BACKEND: &str = "INGEST_DATABASE_BACKEND";

/// Environment variable for the SQLite database path
pub const ENV_SQLITE_PATH: &str = "INGEST_SQLITE_PATH";

/// Environment variable for the PostgreSQL connection URL
pub const ENV_POSTGRES_URL: &str = "INGEST_POSTGRES_URL";

// =============================================================================
// SQLite Configuration
// =============================================================================

/// Default SQLite database file
pub const DEFAULT_SQLITE_PATH: &str = "data/ingest.db";

/// Maximum connections in the SQLite pool
pub const SQLITE_MAX_CONNECTIONS: u32 = 8;

/// Busy timeout for locked databases
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 5;

/// Page cache size (negative = KiB)
pub const SQLITE_CACHE_SIZE: &str = "-16000";

/// Pages between automatic WAL checkpoints
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// Interval of the background WAL checkpoint task
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// PostgreSQL Configuration
// =============================================================================

/// Default maximum pool size
pub const POSTGRES_DEFAULT_MAX_CONNECTIONS: u32 = 100;

/// Default warm connections
pub const POSTGRES_DEFAULT_MIN_CONNECTIONS: u32 = 10;

/// Default acquire timeout
pub const POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout
pub const POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default connection lifetime
pub const POSTGRES_DEFAULT_MAX_LIFETIME_SECS: u64 = 3600;

/// Default statement timeout (0 disables)
pub const POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 60;

/// Interval of the background health check task
pub const POSTGRES_HEALTH_CHECK_INTERVAL_SECS: u64 = 60;

/// Upper bound for the liveness probe
pub const DATABASE_PING_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// Environment Variables - API Keys
// =============================================================================

/// Environment variable for comma-separated bootstrap keys
pub const ENV_API_KEYS: &str = "INGEST_API_KEYS";

/// Environment variable for the optional key-hashing secret
pub const ENV_API_KEY_SECRET: &str = "INGEST_API_KEY_SECRET";

// =============================================================================
// API Keys
// =============================================================================

/// Prefix of generated keys
pub const API_KEY_PREFIX: &str = "ik_";

/// Random characters after the prefix
pub const API_KEY_RANDOM_LENGTH: usize = 40;

/// Header carrying a raw key when Authorization is absent
pub const API_KEY_HEADER: &str = "x-api-key";

/// Window during which the auth cache is considered fresh
pub const AUTH_CACHE_STALENESS_SECS: u64 = 300;

// =============================================================================
// Environment Variables - Rate Limiting
// =============================================================================

/// Environment variable to enable or disable rate limiting
pub const ENV_RATE_LIMIT_ENABLED: &str = "INGEST_RATE_LIMIT_ENABLED";

/// Environment variable for requests per minute
pub const ENV_RATE_LIMIT_RPM: &str = "INGEST_RATE_LIMIT_RPM";

/// Environment variable for burst allowance
pub const ENV_RATE_LIMIT_BURST: &str = "INGEST_RATE_LIMIT_BURST";

/// Environment variable to key the limiter by client IP
pub const ENV_RATE_LIMIT_PER_IP: &str = "INGEST_RATE_LIMIT_PER_IP";

// =============================================================================
// Rate Limiting Defaults
// =============================================================================

/// Default requests per minute
pub const DEFAULT_RATE_LIMIT_RPM: u32 = 1000;

/// Default burst allowance
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 100;

/// Fixed window length
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Interval of the expired-window sweeper
pub const RATE_LIMIT_SWEEP_INTERVAL_SECS: u64 = 120;

// =============================================================================
// Ingestion & Query Limits
// =============================================================================

/// Environment variable for the batch cap
pub const ENV_MAX_BATCH_SIZE: &str = "INGEST_MAX_BATCH_SIZE";

/// Default maximum events per batch
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Default page for filter queries
pub const DEFAULT_PAGE: u32 = 1;

/// Default page size for filter queries
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Maximum page size for filter queries
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Default limit for recent logs
pub const DEFAULT_RECENT_LIMIT: u32 = 50;

/// Maximum limit for recent logs
pub const MAX_RECENT_LIMIT: u32 = 1000;

/// Number of event types reported by metrics
pub const METRICS_TOP_EVENT_TYPES: i64 = 10;

/// Window counted as an active session
pub const ACTIVE_SESSION_WINDOW_MINUTES: i64 = 30;

// =============================================================================
// Shutdown
// =============================================================================

/// Maximum wait for background tasks on shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
