//! Log store row types

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::enums::{EventType, Priority};

/// A validated event ready to be written
#[derive(Debug, Clone)]
pub struct NewLog {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub event_name: String,
    pub properties: serde_json::Value,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub app_version: Option<String>,
    pub device_info: serde_json::Value,
    pub sequence_number: Option<i64>,
    pub priority: Priority,
}

/// Store-assigned identity of an inserted row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedLog {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

/// A persisted log row
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogRow {
    pub id: i64,
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub event_name: String,
    #[schema(value_type = Object)]
    pub properties: serde_json::Value,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub app_version: Option<String>,
    #[schema(value_type = Object)]
    pub device_info: serde_json::Value,
    pub sequence_number: Option<i64>,
    pub priority: String,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// One page of filtered rows plus the total match count
#[derive(Debug, Clone)]
pub struct LogPage {
    pub logs: Vec<LogRow>,
    pub total_count: i64,
}

/// Count of events per type
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventTypeCount {
    pub event_type: String,
    pub count: i64,
}

/// Aggregate ingestion metrics
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogMetrics {
    pub total_logs: i64,
    pub logs_last_hour: i64,
    pub logs_last_day: i64,
    pub active_sessions: i64,
    pub top_event_types: Vec<EventTypeCount>,
}
