//! Body and query extractors for API routes
//!
//! Rejections are rendered as [`ApiError`] so every failure shares the same
//! JSON shape.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::ValidationErrors;

use super::types::{ApiError, FieldError};

/// JSON body extractor with ingestion-style rejections
///
/// Missing or wrong content type is 415, an oversized body 413, anything
/// else that fails to parse 400 `invalid_json`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => ApiError::unsupported_media_type(),
        r if r.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            ApiError::payload_too_large("Request body too large")
        }
        r => {
            tracing::debug!(error = %r.body_text(), "Failed to parse JSON body");
            ApiError::bad_request("invalid_json", "Invalid JSON format")
        }
    }
}

/// Query string extractor
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|r: QueryRejection| ApiError::bad_request("invalid_query", r.body_text()))?;
        Ok(Self(value))
    }
}

/// Flatten validator errors into per-field details
///
/// Fields are sorted by name; `prefix` yields `prefix.field` names.
pub fn validation_details(errors: &ValidationErrors, prefix: Option<&str>) -> Vec<FieldError> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            let name = match prefix {
                Some(p) => format!("{}.{}", p, field),
                None => field.to_string(),
            };
            errs.iter().map(move |e| {
                let message = match (&e.message, &*e.code) {
                    (Some(m), _) => m.to_string(),
                    (None, "required") => "This field is required".to_string(),
                    (None, code) => format!("Validation failed for tag '{}'", code),
                };
                FieldError::new(name.clone(), message)
            })
        })
        .collect()
}
