//! Closed enumerations stored on log rows
//!
//! Both are persisted as their lowercase names and enforced by CHECK
//! constraints on the backing tables.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Category of an ingested event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Behavioral,
    Telemetry,
    Observability,
    Error,
    Performance,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        Self::Behavioral,
        Self::Telemetry,
        Self::Observability,
        Self::Error,
        Self::Performance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Behavioral => "behavioral",
            Self::Telemetry => "telemetry",
            Self::Observability => "observability",
            Self::Error => "error",
            Self::Performance => "performance",
        }
    }

    /// Exact, case-sensitive match against the stored names
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Comma-separated list used in error messages
    pub fn allowed_values() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery priority of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_parse() {
        assert_eq!(EventType::parse("telemetry"), Some(EventType::Telemetry));
        assert_eq!(EventType::parse("Telemetry"), None);
        assert_eq!(EventType::parse("not_a_real_type"), None);
        for t in EventType::ALL {
            assert_eq!(EventType::parse(t.as_str()), Some(t));
        }
    }

    #[test]
    fn test_event_type_serde_matches_as_str() {
        let json = serde_json::to_string(&EventType::Observability).unwrap();
        assert_eq!(json, "\"observability\"");
    }

    #[test]
    fn test_priority_default_and_parse() {
        assert_eq!(Priority::default(), Priority::Normal);
        assert_eq!(Priority::parse("high"), Some(Priority::High));
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn test_allowed_values() {
        assert_eq!(
            EventType::allowed_values(),
            "behavioral, telemetry, observability, error, performance"
        );
    }
}
