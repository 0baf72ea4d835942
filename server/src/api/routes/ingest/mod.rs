//! Ingestion endpoints
//!
//! - POST /api/v1/ingest - One event
//! - POST /api/v1/batch-ingest - Up to `max_batch_size` events, all or nothing

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use validator::Validate;

use crate::api::extractors::{JsonBody, validation_details};
use crate::api::types::{ApiError, FieldError, SuccessResponse};
use crate::data::TransactionalRepository;
use crate::data::types::NewLog;

use types::{BatchIngestRequest, BatchIngestResponse, IngestLogRequest, IngestResponse};

#[derive(Clone)]
pub struct IngestState {
    pub repository: Arc<dyn TransactionalRepository>,
    pub max_batch_size: usize,
}

pub fn routes(repository: Arc<dyn TransactionalRepository>, max_batch_size: usize) -> Router<()> {
    Router::new()
        .route("/ingest", post(ingest_single))
        .route("/batch-ingest", post(ingest_batch))
        .with_state(IngestState {
            repository,
            max_batch_size,
        })
}

/// Ingest a single event
#[utoipa::path(
    post,
    path = "/api/v1/ingest",
    tag = "ingest",
    request_body = IngestLogRequest,
    responses(
        (status = 201, body = SuccessResponse<IngestResponse>, description = "Event stored"),
        (status = 400, body = crate::api::types::ErrorBody, description = "Malformed or invalid event"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 409, body = crate::api::types::ErrorBody, description = "Duplicate event_id"),
        (status = 415, description = "Content-Type is not application/json"),
    ),
    security(("api_key" = []))
)]
pub async fn ingest_single(
    State(state): State<IngestState>,
    JsonBody(req): JsonBody<IngestLogRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<IngestResponse>>), ApiError> {
    req.validate()
        .map_err(|e| ApiError::validation("Invalid log data", validation_details(&e, None)))?;
    let log = req
        .into_new_log()
        .map_err(|e| ApiError::validation("Invalid log data", vec![e]))?;

    let inserted = state
        .repository
        .insert_log(&log)
        .await
        .map_err(|e| ApiError::from_data(e, "Failed to store log"))?;

    tracing::info!(
        event_id = %log.event_id,
        event_type = %log.event_type,
        priority = %log.priority,
        id = inserted.id,
        "Ingested log"
    );

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(
            "Log ingested successfully",
            IngestResponse {
                event_id: log.event_id,
                id: inserted.id,
            },
        )),
    ))
}

/// Ingest a batch of events in one transaction
#[utoipa::path(
    post,
    path = "/api/v1/batch-ingest",
    tag = "ingest",
    request_body = BatchIngestRequest,
    responses(
        (status = 201, body = SuccessResponse<BatchIngestResponse>, description = "Batch stored"),
        (status = 400, body = crate::api::types::ErrorBody, description = "Empty, oversized or invalid batch"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 409, body = crate::api::types::ErrorBody, description = "Duplicate event_id; nothing stored"),
    ),
    security(("api_key" = []))
)]
pub async fn ingest_batch(
    State(state): State<IngestState>,
    JsonBody(batch): JsonBody<BatchIngestRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<BatchIngestResponse>>), ApiError> {
    let total_received = batch.logs.len();
    if total_received == 0 {
        return Err(ApiError::bad_request("empty_batch", "Batch cannot be empty"));
    }
    if total_received > state.max_batch_size {
        return Err(ApiError::bad_request(
            "batch_too_large",
            format!("Batch size cannot exceed {} logs", state.max_batch_size),
        ));
    }

    let logs = validate_batch(batch.logs)?;

    state
        .repository
        .insert_logs_batch(&logs)
        .await
        .map_err(|e| ApiError::from_data(e, "Failed to store logs"))?;

    tracing::info!(count = logs.len(), "Ingested batch");

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(
            format!("Batch of {} logs ingested successfully", logs.len()),
            BatchIngestResponse {
                logs_processed: logs.len(),
                total_received,
            },
        )),
    ))
}

/// Validate every item; any failure rejects the whole batch
fn validate_batch(items: Vec<IngestLogRequest>) -> Result<Vec<NewLog>, ApiError> {
    let mut details: Vec<FieldError> = Vec::new();
    let mut logs = Vec::with_capacity(items.len());

    for (i, item) in items.into_iter().enumerate() {
        let prefix = format!("logs[{}]", i);
        if let Err(e) = item.validate() {
            details.extend(validation_details(&e, Some(&prefix)));
            continue;
        }
        match item.into_new_log() {
            Ok(log) => logs.push(log),
            Err(mut e) => {
                e.field = format!("{}.{}", prefix, e.field);
                details.push(e);
            }
        }
    }

    if details.is_empty() {
        Ok(logs)
    } else {
        Err(ApiError::validation(
            format!("Validation failed for {} logs", details.len()),
            details,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LogRepository;
    use crate::data::sqlite::{SqliteService, test_service};
    use axum::body::Body;
    use axum::http::header;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn setup(max_batch_size: usize) -> (Arc<SqliteService>, Router) {
        let service = test_service().await;
        let repo: Arc<dyn TransactionalRepository> = Arc::new(Arc::clone(&service));
        (service, routes(repo, max_batch_size))
    }

    async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn event(id: &str) -> Value {
        json!({
            "event_id": id,
            "timestamp": "2024-01-01T00:00:00Z",
            "event_type": "behavioral",
            "event_name": "x",
            "properties": {"tags": {"provider": "acme"}},
        })
    }

    #[tokio::test]
    async fn test_single_ingest_and_duplicate() {
        let (service, router) = setup(1000).await;

        let (status, body) = post_json(router.clone(), "/ingest", event("e1")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Log ingested successfully");
        assert_eq!(body["data"]["event_id"], "e1");
        assert!(body["data"]["id"].as_i64().unwrap() > 0);

        let (status, body) = post_json(router, "/ingest", event("e1")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "duplicate_event");
        assert_eq!(service.count_logs().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_single_ingest_validation_lists_fields() {
        let (service, router) = setup(1000).await;
        let (status, body) = post_json(router, "/ingest", json!({"event_type": "nope"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
        assert_eq!(body["message"], "Invalid log data");
        assert_eq!(body["details"].as_array().unwrap().len(), 3);
        assert_eq!(service.count_logs().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_required_fields_are_validation_errors() {
        let (service, router) = setup(1000).await;
        let mut blank = event("");
        blank["event_name"] = json!("");

        let (status, body) = post_json(router, "/ingest", blank).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
        assert_eq!(body["details"][0]["field"], "event_id");
        assert_eq!(body["details"][0]["message"], "This field is required");
        assert_eq!(body["details"][1]["field"], "event_name");
        assert_eq!(service.count_logs().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_timestamp_uses_ingestion_time() {
        let (service, router) = setup(1000).await;
        let mut untimed = event("t1");
        untimed.as_object_mut().unwrap().remove("timestamp");

        let (status, _) = post_json(router, "/ingest", untimed).await;
        assert_eq!(status, StatusCode::CREATED);

        let rows = service.recent_logs(1).await.unwrap();
        assert_eq!(rows[0].event_id, "t1");
        let drift = (rows[0].created_at - rows[0].timestamp).num_seconds().abs();
        assert!(drift < 5);
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let (_service, router) = setup(1000).await;
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/ingest")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"event_id\":"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_batch_ingest() {
        let (service, router) = setup(1000).await;
        let (status, body) = post_json(
            router,
            "/batch-ingest",
            json!({"logs": [event("b1"), event("b2"), event("b3")]}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Batch of 3 logs ingested successfully");
        assert_eq!(body["data"]["logs_processed"], 3);
        assert_eq!(body["data"]["total_received"], 3);
        assert_eq!(service.count_logs().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let (_service, router) = setup(1000).await;
        let (status, body) = post_json(router, "/batch-ingest", json!({"logs": []})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "empty_batch");
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected_before_insert() {
        let (service, router) = setup(1000).await;
        let logs: Vec<Value> = (0..1001).map(|i| event(&format!("big-{}", i))).collect();

        let (status, body) = post_json(router, "/batch-ingest", json!({ "logs": logs })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "batch_too_large");
        assert_eq!(body["message"], "Batch size cannot exceed 1000 logs");
        assert_eq!(service.count_logs().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_validation_prefixes_fields() {
        let (service, router) = setup(1000).await;
        let mut bad = event("v2");
        bad["event_type"] = json!("bogus");

        let (status, body) =
            post_json(router, "/batch-ingest", json!({"logs": [event("v1"), bad]})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation failed for 1 logs");
        assert_eq!(body["details"][0]["field"], "logs[1].event_type");
        assert_eq!(service.count_logs().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_with_empty_event_id_stores_nothing() {
        let (service, router) = setup(1000).await;
        let (status, body) = post_json(
            router,
            "/batch-ingest",
            json!({"logs": [event("ok-1"), event("")]}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
        assert_eq!(body["details"][0]["field"], "logs[1].event_id");
        assert_eq!(body["details"][0]["message"], "This field is required");
        assert_eq!(service.count_logs().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_with_duplicate_stores_nothing() {
        let (service, router) = setup(1000).await;
        let (status, body) = post_json(
            router,
            "/batch-ingest",
            json!({"logs": [event("d1"), event("d2"), event("d1")]}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "duplicate_event");
        assert_eq!(service.count_logs().await.unwrap(), 0);
    }
}
