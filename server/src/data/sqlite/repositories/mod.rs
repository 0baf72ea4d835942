//! SQLite repositories
//!
//! Types (NewLog, LogRow, ApiKeyRecord, etc.) should be imported from `crate::data::types`.

pub mod api_key;
pub mod log;

pub use api_key::{
    create_api_key, get_by_hash as get_api_key_by_hash, set_active as set_api_key_active,
    touch_api_key,
};
pub use log::{count_logs, insert_log, insert_logs_batch, log_metrics, query_logs, recent_logs};
