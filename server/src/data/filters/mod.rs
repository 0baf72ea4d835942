//! Log filter compiler
//!
//! Turns sparse, user-supplied query parameters into a parameterized count
//! query and page query over `analytics_logs`.
//!
//! ## Usage
//!
//! ```no_run
//! use ingest_server::data::filters::{LogFilter, LogFilterParams, build_log_query};
//! use ingest_server::data::sql::SqliteDialect;
//!
//! let params = LogFilterParams {
//!     event_type: Some("behavioral".to_string()),
//!     ..Default::default()
//! };
//! let filter = LogFilter::from_params(&params).unwrap();
//! let query = build_log_query(&filter, &SqliteDialect);
//! ```

mod builder;
mod types;

pub use builder::{LOG_COLUMNS, LOGS_TABLE, LogQuery, build_log_query};
pub use types::{
    CompareOp, FilterColumn, FilterError, LogFilter, LogFilterParams, Predicate, SortColumn,
    SortOrder, SqlParams, SqlValue,
};
