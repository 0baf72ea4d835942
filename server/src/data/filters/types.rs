//! Filter type definitions
//!
//! Defines the predicate, sort and pagination types used for querying logs.
//! Only values ever reach bound parameters. Column names and sort directions
//! come from closed enums.

use chrono::DateTime;
use serde::Deserialize;
use thiserror::Error;
use utoipa::IntoParams;

use crate::core::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::data::sql::SqlDialect;
use crate::data::types::{EventType, Priority};

/// Raw filter query string, all values as received
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogFilterParams {
    /// One of behavioral, telemetry, observability, error, performance
    pub event_type: Option<String>,
    pub event_name: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub app_version: Option<String>,
    /// normal or high
    pub priority: Option<String>,
    /// Matches `properties.tags.provider`
    pub provider_name: Option<String>,
    /// RFC 3339 lower bound on created_at (inclusive)
    pub start_time: Option<String>,
    /// RFC 3339 upper bound on created_at (inclusive)
    pub end_time: Option<String>,
    /// Page number, starting at 1
    pub page: Option<String>,
    /// Rows per page (1-1000)
    pub page_size: Option<String>,
    pub sort_by: Option<String>,
    /// ASC or DESC
    pub sort_order: Option<String>,
}

/// Rejected filter input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid event_type '{0}'. Allowed values: {allowed}", allowed = EventType::allowed_values())]
    InvalidEventType(String),

    #[error("Invalid priority '{0}'. Allowed values: normal, high")]
    InvalidPriority(String),

    #[error("Invalid start_time '{0}'. Expected an RFC 3339 timestamp")]
    InvalidStartTime(String),

    #[error("Invalid end_time '{0}'. Expected an RFC 3339 timestamp")]
    InvalidEndTime(String),
}

impl FilterError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidEventType(_) => "invalid_event_type",
            Self::InvalidPriority(_) => "invalid_priority",
            Self::InvalidStartTime(_) => "invalid_start_time",
            Self::InvalidEndTime(_) => "invalid_end_time",
        }
    }

    /// Query parameter that failed
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidEventType(_) => "event_type",
            Self::InvalidPriority(_) => "priority",
            Self::InvalidStartTime(_) => "start_time",
            Self::InvalidEndTime(_) => "end_time",
        }
    }
}

/// Columns a predicate may target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColumn {
    EventType,
    EventName,
    UserId,
    SessionId,
    AppVersion,
    Priority,
    /// Nested `properties.tags.provider`
    ProviderName,
    CreatedAt,
}

impl FilterColumn {
    /// SQL expression for this column in the given dialect
    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        match self {
            Self::EventType => "event_type".to_string(),
            Self::EventName => "event_name".to_string(),
            Self::UserId => "user_id".to_string(),
            Self::SessionId => "session_id".to_string(),
            Self::AppVersion => "app_version".to_string(),
            Self::Priority => "priority".to_string(),
            Self::ProviderName => dialect.json_text_path("properties", &["tags", "provider"]),
            Self::CreatedAt => "created_at".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gte,
    Lte,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }
}

/// A bound parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
}

/// One `column op value` condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: FilterColumn,
    pub op: CompareOp,
    pub value: SqlValue,
}

impl Predicate {
    fn eq(column: FilterColumn, value: impl Into<String>) -> Self {
        Self {
            column,
            op: CompareOp::Eq,
            value: SqlValue::Text(value.into()),
        }
    }

    /// Render with the next placeholder and push the value
    pub fn to_sql(&self, dialect: &dyn SqlDialect, params: &mut SqlParams) -> String {
        params.values.push(self.value.clone());
        format!(
            "{} {} {}",
            self.column.to_sql(dialect),
            self.op.as_sql(),
            dialect.placeholder(params.values.len())
        )
    }
}

/// Collects SQL parameters during query building (maintains insertion order)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SqlParams {
    pub values: Vec<SqlValue>,
}

/// Sortable columns (anything else falls back to `created_at`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    Id,
    EventId,
    Timestamp,
    EventType,
    EventName,
    UserId,
    SessionId,
    AppVersion,
    Priority,
    #[default]
    CreatedAt,
}

impl SortColumn {
    pub const ALL: [SortColumn; 10] = [
        Self::Id,
        Self::EventId,
        Self::Timestamp,
        Self::EventType,
        Self::EventName,
        Self::UserId,
        Self::SessionId,
        Self::AppVersion,
        Self::Priority,
        Self::CreatedAt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::EventId => "event_id",
            Self::Timestamp => "timestamp",
            Self::EventType => "event_type",
            Self::EventName => "event_name",
            Self::UserId => "user_id",
            Self::SessionId => "session_id",
            Self::AppVersion => "app_version",
            Self::Priority => "priority",
            Self::CreatedAt => "created_at",
        }
    }

    /// Allow-list lookup; unknown or absent values yield the default
    pub fn from_param(value: Option<&str>) -> Self {
        value
            .and_then(|v| Self::ALL.into_iter().find(|c| c.as_str() == v))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Case-insensitive; anything but asc/desc yields DESC
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }
}

/// A validated filter ready to compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub predicates: Vec<Predicate>,
    pub sort_by: SortColumn,
    pub sort_order: SortOrder,
    pub page: u32,
    pub page_size: u32,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            sort_by: SortColumn::default(),
            sort_order: SortOrder::default(),
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl LogFilter {
    /// Validate raw parameters into predicates, sort and pagination
    ///
    /// Blank strings are treated as absent; other values are bound as given.
    /// Enumerations and timestamps are
    /// checked before anything else happens.
    pub fn from_params(params: &LogFilterParams) -> Result<Self, FilterError> {
        let mut predicates = Vec::new();

        if let Some(v) = present(&params.event_type) {
            let event_type =
                EventType::parse(v).ok_or_else(|| FilterError::InvalidEventType(v.to_string()))?;
            predicates.push(Predicate::eq(FilterColumn::EventType, event_type.as_str()));
        }
        if let Some(v) = present(&params.event_name) {
            predicates.push(Predicate::eq(FilterColumn::EventName, v));
        }
        if let Some(v) = present(&params.user_id) {
            predicates.push(Predicate::eq(FilterColumn::UserId, v));
        }
        if let Some(v) = present(&params.session_id) {
            predicates.push(Predicate::eq(FilterColumn::SessionId, v));
        }
        if let Some(v) = present(&params.app_version) {
            predicates.push(Predicate::eq(FilterColumn::AppVersion, v));
        }
        if let Some(v) = present(&params.priority) {
            let priority =
                Priority::parse(v).ok_or_else(|| FilterError::InvalidPriority(v.to_string()))?;
            predicates.push(Predicate::eq(FilterColumn::Priority, priority.as_str()));
        }
        if let Some(v) = present(&params.provider_name) {
            predicates.push(Predicate::eq(FilterColumn::ProviderName, v));
        }
        if let Some(v) = present(&params.start_time) {
            let micros =
                parse_timestamp(v).ok_or_else(|| FilterError::InvalidStartTime(v.to_string()))?;
            predicates.push(Predicate {
                column: FilterColumn::CreatedAt,
                op: CompareOp::Gte,
                value: SqlValue::Int(micros),
            });
        }
        if let Some(v) = present(&params.end_time) {
            let micros =
                parse_timestamp(v).ok_or_else(|| FilterError::InvalidEndTime(v.to_string()))?;
            predicates.push(Predicate {
                column: FilterColumn::CreatedAt,
                op: CompareOp::Lte,
                value: SqlValue::Int(micros),
            });
        }

        let page = present(&params.page)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE);
        let page_size = present(&params.page_size)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Ok(Self {
            predicates,
            sort_by: SortColumn::from_param(present(&params.sort_by)),
            sort_order: SortOrder::from_param(present(&params.sort_order)),
            page,
            page_size,
        })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// ceil(total / page_size)
    pub fn total_pages(&self, total_count: i64) -> u32 {
        let total = u64::try_from(total_count).unwrap_or(0);
        u32::try_from(total.div_ceil(u64::from(self.page_size.max(1)))).unwrap_or(u32::MAX)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn parse_timestamp(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_micros())
}
