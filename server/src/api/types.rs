//! Shared API types
//!
//! Success envelope and error rendering used by every endpoint.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::data::DataError;

/// One offending field in a rejected request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error body shared by all endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// HTTP category, e.g. `bad_request`
    pub error: &'static str,
    /// Stable machine-readable code
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Success envelope
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest {
        code: String,
        message: String,
        details: Vec<FieldError>,
    },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    PayloadTooLarge { message: String },
    UnsupportedMediaType { message: String },
    Internal { code: String, message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// 400 `validation_error` listing every offending field
    pub fn validation(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self::BadRequest {
            code: "validation_error".to_string(),
            message: message.into(),
            details,
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge {
            message: message.into(),
        }
    }

    pub fn unsupported_media_type() -> Self {
        Self::UnsupportedMediaType {
            message: "Content-Type must be application/json".to_string(),
        }
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Map a store failure; duplicates become 409 `duplicate_event`
    pub fn from_data(e: DataError, message: &str) -> Self {
        match e {
            DataError::Conflict(detail) => Self::conflict("duplicate_event", detail),
            e => {
                tracing::error!(error = %e, backend = e.backend(), "{}", message);
                Self::internal("database_error", message)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, code, message, details) = match self {
            Self::BadRequest {
                code,
                message,
                details,
            } => (
                "bad_request",
                code,
                message,
                (!details.is_empty()).then_some(details),
            ),
            Self::NotFound { code, message } => ("not_found", code, message, None),
            Self::Conflict { code, message } => ("conflict", code, message, None),
            Self::PayloadTooLarge { message } => (
                "payload_too_large",
                "request_too_large".to_string(),
                message,
                None,
            ),
            Self::UnsupportedMediaType { message } => (
                "unsupported_media_type",
                "unsupported_media_type".to_string(),
                message,
                None,
            ),
            Self::Internal { code, message } => ("internal_error", code, message, None),
        };
        (
            status,
            Json(ErrorBody {
                error,
                code,
                message,
                details,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_lists_details() {
        let err = ApiError::validation(
            "Invalid log data",
            vec![
                FieldError::new("event_id", "This field is required"),
                FieldError::new("event_type", "This field is required"),
            ],
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["code"], "validation_error");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
        assert_eq!(body["details"][0]["field"], "event_id");
    }

    #[tokio::test]
    async fn test_details_omitted_when_empty() {
        let body = body_json(
            ApiError::bad_request("empty_batch", "Batch cannot be empty").into_response(),
        )
        .await;
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_conflict_from_data() {
        let err = ApiError::from_data(
            DataError::Conflict("Event with ID 'e1' already exists".to_string()),
            "Failed to store log",
        );
        assert_eq!(err.status(), StatusCode::CONFLICT);
        let body = body_json(err.into_response()).await;
        assert_eq!(body["code"], "duplicate_event");
    }

    #[tokio::test]
    async fn test_store_failure_hides_detail() {
        let err = ApiError::from_data(
            DataError::Config("connection refused".to_string()),
            "Failed to store log",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(err.into_response()).await;
        assert_eq!(body["code"], "database_error");
        assert_eq!(body["message"], "Failed to store log");
    }

    #[test]
    fn test_success_envelope() {
        let value = serde_json::to_value(SuccessResponse::new("ok", 5)).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"], 5);
    }
}
