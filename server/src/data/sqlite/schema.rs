//! SQLite schema definitions
//!
//! `SCHEMA` always describes the latest version. Fresh databases apply it
//! directly; older ones step through the versioned migrations.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Analytics Logs (timestamps are microseconds since epoch)
-- =============================================================================
CREATE TABLE IF NOT EXISTS analytics_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id TEXT NOT NULL UNIQUE CHECK(length(event_id) >= 1),
    timestamp INTEGER NOT NULL,
    event_type TEXT NOT NULL CHECK(event_type IN ('behavioral', 'telemetry', 'observability', 'error', 'performance')),
    event_name TEXT NOT NULL CHECK(length(event_name) >= 1),
    properties TEXT NOT NULL DEFAULT '{}',
    user_id TEXT,
    session_id TEXT,
    app_version TEXT,
    device_info TEXT NOT NULL DEFAULT '{}',
    sequence_number INTEGER,
    priority TEXT NOT NULL DEFAULT 'normal' CHECK(priority IN ('normal', 'high')),
    created_at INTEGER NOT NULL,
    processed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_logs_created_at ON analytics_logs(created_at);
CREATE INDEX IF NOT EXISTS idx_logs_event_type ON analytics_logs(event_type, created_at);
CREATE INDEX IF NOT EXISTS idx_logs_event_name ON analytics_logs(event_name);
CREATE INDEX IF NOT EXISTS idx_logs_user_id ON analytics_logs(user_id);
CREATE INDEX IF NOT EXISTS idx_logs_session_created ON analytics_logs(session_id, created_at);

-- =============================================================================
-- 2. API Keys (only the hash of a key is stored)
-- =============================================================================
CREATE TABLE IF NOT EXISTS api_keys (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key_hash TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    last_used_at INTEGER,
    expires_at INTEGER,
    usage_count INTEGER NOT NULL DEFAULT 0
);
"#;
