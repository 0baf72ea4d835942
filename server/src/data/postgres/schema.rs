//! PostgreSQL schema definitions
//!
//! Mirrors the SQLite schema. Timestamps are BIGINT microseconds, documents
//! are JSONB.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Complete schema SQL (multi-statement, executed as raw SQL)
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at BIGINT NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at BIGINT NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms BIGINT,
    success BOOLEAN NOT NULL DEFAULT TRUE
);

CREATE TABLE IF NOT EXISTS analytics_logs (
    id BIGSERIAL PRIMARY KEY,
    event_id TEXT NOT NULL UNIQUE CHECK (length(event_id) >= 1),
    timestamp BIGINT NOT NULL,
    event_type TEXT NOT NULL CHECK (event_type IN ('behavioral', 'telemetry', 'observability', 'error', 'performance')),
    event_name TEXT NOT NULL CHECK (length(event_name) >= 1),
    properties JSONB NOT NULL DEFAULT '{}'::jsonb,
    user_id TEXT,
    session_id TEXT,
    app_version TEXT,
    device_info JSONB NOT NULL DEFAULT '{}'::jsonb,
    sequence_number BIGINT,
    priority TEXT NOT NULL DEFAULT 'normal' CHECK (priority IN ('normal', 'high')),
    created_at BIGINT NOT NULL,
    processed_at BIGINT
);

CREATE INDEX IF NOT EXISTS idx_logs_created_at ON analytics_logs(created_at);
CREATE INDEX IF NOT EXISTS idx_logs_event_type ON analytics_logs(event_type, created_at);
CREATE INDEX IF NOT EXISTS idx_logs_event_name ON analytics_logs(event_name);
CREATE INDEX IF NOT EXISTS idx_logs_user_id ON analytics_logs(user_id);
CREATE INDEX IF NOT EXISTS idx_logs_session_created ON analytics_logs(session_id, created_at);

CREATE TABLE IF NOT EXISTS api_keys (
    id BIGSERIAL PRIMARY KEY,
    key_hash TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at BIGINT NOT NULL,
    last_used_at BIGINT,
    expires_at BIGINT,
    usage_count BIGINT NOT NULL DEFAULT 0
);
"#;
