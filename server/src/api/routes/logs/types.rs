//! Log query request and response types

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::core::constants::{DEFAULT_RECENT_LIMIT, MAX_RECENT_LIMIT};
use crate::data::types::LogRow;

/// Query parameters for recent logs
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentLogsParams {
    /// Rows to return (1-1000, default 50)
    pub limit: Option<String>,
}

impl RecentLogsParams {
    /// Out-of-range or unparseable limits fall back to the default
    pub fn limit(&self) -> u32 {
        self.limit
            .as_deref()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|l| (1..=MAX_RECENT_LIMIT).contains(l))
            .unwrap_or(DEFAULT_RECENT_LIMIT)
    }
}

/// One page of filtered logs
#[derive(Debug, Serialize, ToSchema)]
pub struct FilteredLogsResponse {
    pub logs: Vec<LogRow>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecentLogsResponse {
    pub logs: Vec<LogRow>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(raw: Option<&str>) -> u32 {
        RecentLogsParams {
            limit: raw.map(str::to_string),
        }
        .limit()
    }

    #[test]
    fn test_recent_limit_bounds() {
        assert_eq!(limit(None), 50);
        assert_eq!(limit(Some("10")), 10);
        assert_eq!(limit(Some("1000")), 1000);
        assert_eq!(limit(Some("1001")), 50);
        assert_eq!(limit(Some("0")), 50);
        assert_eq!(limit(Some("-3")), 50);
        assert_eq!(limit(Some("ten")), 50);
    }
}
