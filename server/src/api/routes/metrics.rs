//! Metrics and status endpoints
//!
//! - GET /api/v1/metrics - Aggregate ingestion counters
//! - GET /api/v1/status - Service identity, store state and metrics

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::ServiceInfo;
use crate::api::types::{ApiError, SuccessResponse};
use crate::data::TransactionalService;
use crate::data::types::LogMetrics;

#[derive(Clone)]
pub struct MetricsState {
    pub database: Arc<TransactionalService>,
    pub info: Arc<ServiceInfo>,
}

pub fn routes(database: Arc<TransactionalService>, info: Arc<ServiceInfo>) -> Router<()> {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/status", get(status))
        .with_state(MetricsState { database, info })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    pub name: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub uptime: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseStatus {
    pub backend: String,
    pub status: &'static str,
    pub total_logs: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub service: ServiceStatus,
    pub database: DatabaseStatus,
    pub metrics: LogMetrics,
}

/// Aggregate ingestion metrics
#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    tag = "metrics",
    responses(
        (status = 200, body = SuccessResponse<LogMetrics>, description = "Current metrics"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, body = crate::api::types::ErrorBody, description = "Store failure"),
    ),
    security(("api_key" = []))
)]
pub async fn metrics(
    State(state): State<MetricsState>,
) -> Result<Json<SuccessResponse<LogMetrics>>, ApiError> {
    let metrics = state
        .database
        .repository()
        .log_metrics(Utc::now())
        .await
        .map_err(|e| ApiError::from_data(e, "Failed to retrieve metrics"))?;

    Ok(Json(SuccessResponse::new(
        "Metrics retrieved successfully",
        metrics,
    )))
}

/// Service status
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "metrics",
    responses(
        (status = 200, body = SuccessResponse<StatusResponse>, description = "Service status"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, body = crate::api::types::ErrorBody, description = "Store failure"),
    ),
    security(("api_key" = []))
)]
pub async fn status(
    State(state): State<MetricsState>,
) -> Result<Json<SuccessResponse<StatusResponse>>, ApiError> {
    let repository = state.database.repository();
    let total_logs = repository
        .count_logs()
        .await
        .map_err(|e| ApiError::from_data(e, "Failed to retrieve status"))?;
    let metrics = repository
        .log_metrics(Utc::now())
        .await
        .map_err(|e| ApiError::from_data(e, "Failed to retrieve metrics"))?;

    let info = &state.info;
    Ok(Json(SuccessResponse::new(
        "Status retrieved successfully",
        StatusResponse {
            service: ServiceStatus {
                name: info.name,
                version: info.version,
                environment: info.environment.clone(),
                uptime: info.uptime(),
                started_at: info.started_at,
            },
            database: DatabaseStatus {
                backend: state.database.backend().to_string(),
                status: "healthy",
                total_logs,
            },
            metrics,
        },
    )))
}
