//! Shared data types for all database backends
//!
//! Both relational backends (SQLite, PostgreSQL) read and write these types,
//! so the HTTP layer never depends on a specific driver.

mod api_keys;
mod enums;
mod logs;

pub use api_keys::ApiKeyRecord;
pub use enums::{EventType, Priority};
pub use logs::{EventTypeCount, InsertedLog, LogMetrics, LogPage, LogRow, NewLog};
