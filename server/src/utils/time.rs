//! Time utility functions
//!
//! Both stores persist timestamps as microseconds since the Unix epoch.

use chrono::{DateTime, Utc};

/// Convert microseconds since Unix epoch to DateTime<Utc>
pub fn micros_to_datetime(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_else(|| {
        tracing::warn!(micros, "Invalid timestamp, using epoch");
        DateTime::UNIX_EPOCH
    })
}

/// Convert DateTime<Utc> to microseconds since Unix epoch
pub fn datetime_to_micros(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_micros()
}

/// Current time in microseconds since Unix epoch
pub fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

/// Format a duration in seconds as `1h 2m 3s`
pub fn format_uptime(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_micros_to_datetime_epoch() {
        let dt = micros_to_datetime(0);
        assert_eq!(dt.year(), 1970);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 1);
    }

    #[test]
    fn test_micros_to_datetime_known_value() {
        // 2024-01-01 00:00:00 UTC = 1704067200 seconds
        let dt = micros_to_datetime(1_704_067_200_000_000);
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.timestamp(), 1_704_067_200);
    }

    #[test]
    fn test_micros_roundtrip_keeps_precision() {
        let dt = micros_to_datetime(1_704_067_200_123_456);
        assert_eq!(datetime_to_micros(&dt), 1_704_067_200_123_456);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(5), "5s");
        assert_eq!(format_uptime(125), "2m 5s");
        assert_eq!(format_uptime(3725), "1h 2m 5s");
    }
}
