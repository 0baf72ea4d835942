//! Repository trait implementations for PostgreSQL
//!
//! Implements the log and API key repository traits for Arc<PostgresService>,
//! delegating to the free functions in `repositories`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::data::error::DataError;
use crate::data::filters::LogFilter;
use crate::data::traits::{ApiKeyRepository, LogRepository};
use crate::data::types::{ApiKeyRecord, InsertedLog, LogMetrics, LogPage, LogRow, NewLog};

use super::PostgresService;
use super::repositories::{api_key, log};

#[async_trait]
impl LogRepository for Arc<PostgresService> {
    async fn insert_log(&self, new_log: &NewLog) -> Result<InsertedLog, DataError> {
        log::insert_log(self.pool(), new_log)
            .await
            .map_err(Into::into)
    }

    async fn insert_logs_batch(&self, logs: &[NewLog]) -> Result<Vec<InsertedLog>, DataError> {
        log::insert_logs_batch(self.pool(), logs)
            .await
            .map_err(Into::into)
    }

    async fn query_logs(&self, filter: &LogFilter) -> Result<LogPage, DataError> {
        log::query_logs(self.pool(), filter)
            .await
            .map_err(Into::into)
    }

    async fn recent_logs(&self, limit: u32) -> Result<Vec<LogRow>, DataError> {
        log::recent_logs(self.pool(), limit)
            .await
            .map_err(Into::into)
    }

    async fn count_logs(&self) -> Result<i64, DataError> {
        log::count_logs(self.pool()).await.map_err(Into::into)
    }

    async fn log_metrics(&self, now: DateTime<Utc>) -> Result<LogMetrics, DataError> {
        log::log_metrics(self.pool(), now)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl ApiKeyRepository for Arc<PostgresService> {
    async fn get_api_key_by_hash(
        &self,
        key_hash: &str,
    ) -> Result<Option<ApiKeyRecord>, DataError> {
        api_key::get_by_hash(self.pool(), key_hash)
            .await
            .map_err(Into::into)
    }

    async fn create_api_key(
        &self,
        key_hash: &str,
        name: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ApiKeyRecord, DataError> {
        api_key::create_api_key(self.pool(), key_hash, name, expires_at)
            .await
            .map_err(Into::into)
    }

    async fn record_api_key_usage(&self, key_hash: &str) -> Result<(), DataError> {
        api_key::touch_api_key(self.pool(), key_hash)
            .await
            .map_err(Into::into)
    }

    async fn set_api_key_active(&self, key_hash: &str, active: bool) -> Result<bool, DataError> {
        api_key::set_active(self.pool(), key_hash, active)
            .await
            .map_err(Into::into)
    }
}
