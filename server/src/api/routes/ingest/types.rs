//! Ingestion request and response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::api::types::FieldError;
use crate::data::types::{EventType, NewLog, Priority};

/// One event as submitted
///
/// Every field is optional at the serde level so that a missing field is
/// reported by validation (with all other failures) rather than as a parse
/// error.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct IngestLogRequest {
    /// Client-assigned unique id
    #[validate(required, custom(function = "validate_not_empty"))]
    pub event_id: Option<String>,

    /// RFC 3339 timestamp; ingestion time when absent
    #[validate(custom(function = "validate_timestamp"))]
    pub timestamp: Option<String>,

    #[validate(required, custom(function = "validate_event_type"))]
    pub event_type: Option<String>,

    #[validate(required, custom(function = "validate_not_empty"))]
    pub event_name: Option<String>,

    #[schema(value_type = Option<Object>)]
    #[validate(custom(function = "validate_object"))]
    pub properties: Option<Value>,

    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub app_version: Option<String>,

    #[schema(value_type = Option<Object>)]
    #[validate(custom(function = "validate_object"))]
    pub device_info: Option<Value>,

    pub sequence_number: Option<i64>,

    /// normal (default) or high
    #[validate(custom(function = "validate_priority"))]
    pub priority: Option<String>,
}

impl IngestLogRequest {
    /// Convert a validated request into a storable event
    ///
    /// Absent documents become `{}`, an absent priority `normal` and an
    /// absent timestamp the current time.
    pub fn into_new_log(self) -> Result<NewLog, FieldError> {
        let required = |field: &str| FieldError::new(field, "This field is required");

        let timestamp = match self.timestamp.as_deref() {
            Some(t) => parse_timestamp(t).ok_or_else(|| required("timestamp"))?,
            None => Utc::now(),
        };
        let event_type = self
            .event_type
            .as_deref()
            .and_then(EventType::parse)
            .ok_or_else(|| required("event_type"))?;
        let priority = match self.priority.as_deref() {
            Some(p) => Priority::parse(p).ok_or_else(|| required("priority"))?,
            None => Priority::default(),
        };

        Ok(NewLog {
            event_id: self.event_id.ok_or_else(|| required("event_id"))?,
            timestamp,
            event_type,
            event_name: self.event_name.ok_or_else(|| required("event_name"))?,
            properties: self.properties.unwrap_or_else(empty_object),
            user_id: self.user_id,
            session_id: self.session_id,
            app_version: self.app_version,
            device_info: self.device_info.unwrap_or_else(empty_object),
            sequence_number: self.sequence_number,
            priority,
        })
    }
}

/// Batch of events
#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchIngestRequest {
    #[serde(default)]
    pub logs: Vec<IngestLogRequest>,
}

/// Identity of a stored event
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    pub event_id: String,
    pub id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchIngestResponse {
    pub logs_processed: usize,
    pub total_received: usize,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(ValidationError::new("required"))
    } else {
        Ok(())
    }
}

fn validate_timestamp(value: &str) -> Result<(), ValidationError> {
    match parse_timestamp(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("timestamp")
            .with_message("Must be an RFC 3339 timestamp (e.g., 2023-01-01T00:00:00Z)".into())),
    }
}

fn validate_event_type(value: &str) -> Result<(), ValidationError> {
    match EventType::parse(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("oneof").with_message(
            format!(
                "Must be one of: {}",
                EventType::ALL.map(|t| t.as_str()).join(" ")
            )
            .into(),
        )),
    }
}

fn validate_priority(value: &str) -> Result<(), ValidationError> {
    match Priority::parse(value) {
        Some(_) => Ok(()),
        None => Err(
            ValidationError::new("oneof").with_message("Must be one of: normal high".into()),
        ),
    }
}

fn validate_object(value: &Value) -> Result<(), ValidationError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(ValidationError::new("object").with_message("Must be a JSON object".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::extractors::validation_details;
    use serde_json::json;

    fn parse(value: Value) -> IngestLogRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_request_converts_with_defaults() {
        let req = parse(json!({
            "event_id": "e1",
            "timestamp": "2024-05-01T10:00:00+02:00",
            "event_type": "behavioral",
            "event_name": "click",
        }));
        req.validate().unwrap();

        let log = req.into_new_log().unwrap();
        assert_eq!(log.event_id, "e1");
        assert_eq!(log.event_type, EventType::Behavioral);
        assert_eq!(log.priority, Priority::Normal);
        assert_eq!(log.properties, json!({}));
        assert_eq!(log.device_info, json!({}));
        assert_eq!(log.timestamp.to_rfc3339(), "2024-05-01T08:00:00+00:00");
    }

    #[test]
    fn test_every_failure_reported() {
        let req = parse(json!({
            "timestamp": "yesterday",
            "event_type": "clicks",
            "priority": "urgent",
            "properties": [1, 2],
        }));
        let errors = req.validate().unwrap_err();
        let details = validation_details(&errors, None);
        let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["event_id", "event_name", "event_type", "priority", "properties", "timestamp"]
        );

        let event_type = details.iter().find(|d| d.field == "event_type").unwrap();
        assert_eq!(
            event_type.message,
            "Must be one of: behavioral telemetry observability error performance"
        );
        let event_id = details.iter().find(|d| d.field == "event_id").unwrap();
        assert_eq!(event_id.message, "This field is required");
    }

    #[test]
    fn test_empty_strings_are_missing() {
        let req = parse(json!({
            "event_id": "",
            "event_type": "error",
            "event_name": "",
        }));
        let errors = req.validate().unwrap_err();
        let details = validation_details(&errors, None);
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].field, "event_id");
        assert_eq!(details[0].message, "This field is required");
        assert_eq!(details[1].field, "event_name");
        assert_eq!(details[1].message, "This field is required");
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        let before = Utc::now();
        let req = parse(json!({
            "event_id": "e2",
            "event_type": "telemetry",
            "event_name": "tick",
        }));
        req.validate().unwrap();

        let log = req.into_new_log().unwrap();
        assert!(log.timestamp >= before);
        assert!(log.timestamp <= Utc::now());
    }

    #[test]
    fn test_batch_defaults_to_empty() {
        let batch: BatchIngestRequest = serde_json::from_value(json!({})).unwrap();
        assert!(batch.logs.is_empty());
    }
}
