//! Repository traits for database backends
//!
//! This module defines traits that provide a unified interface for database operations
//! across both relational backends. SQLite and PostgreSQL each implement these
//! traits with their own specific SQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::data::error::DataError;
use crate::data::filters::LogFilter;
use crate::data::types::{ApiKeyRecord, InsertedLog, LogMetrics, LogPage, LogRow, NewLog};

// ============================================================================
// Log Repository Trait
// ============================================================================

/// Repository trait for the log store
#[async_trait]
pub trait LogRepository: Send + Sync {
    /// Insert one event; a duplicate `event_id` yields `DataError::Conflict`
    async fn insert_log(&self, log: &NewLog) -> Result<InsertedLog, DataError>;

    /// Insert all events in one transaction (all or nothing)
    async fn insert_logs_batch(&self, logs: &[NewLog]) -> Result<Vec<InsertedLog>, DataError>;

    /// Run the compiled filter's count and page queries
    async fn query_logs(&self, filter: &LogFilter) -> Result<LogPage, DataError>;

    /// Newest rows by `created_at`
    async fn recent_logs(&self, limit: u32) -> Result<Vec<LogRow>, DataError>;

    async fn count_logs(&self) -> Result<i64, DataError>;

    /// Aggregate counts relative to `now`
    async fn log_metrics(&self, now: DateTime<Utc>) -> Result<LogMetrics, DataError>;
}

// ============================================================================
// API Key Repository Trait
// ============================================================================

/// Repository trait for the API key store
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// Exact lookup by hash, regardless of active/expiry state
    async fn get_api_key_by_hash(&self, key_hash: &str)
    -> Result<Option<ApiKeyRecord>, DataError>;

    /// Insert an active key; a duplicate hash yields `DataError::Conflict`
    async fn create_api_key(
        &self,
        key_hash: &str,
        name: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ApiKeyRecord, DataError>;

    /// `usage_count + 1`, `last_used_at = now`
    async fn record_api_key_usage(&self, key_hash: &str) -> Result<(), DataError>;

    /// Flip `is_active`; returns false when no key has this hash
    async fn set_api_key_active(&self, key_hash: &str, active: bool) -> Result<bool, DataError>;
}

/// Combined store used by the HTTP layer and the authenticator
pub trait TransactionalRepository: LogRepository + ApiKeyRepository {}

impl<T: LogRepository + ApiKeyRepository> TransactionalRepository for T {}
