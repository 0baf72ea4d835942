//! Log query endpoints
//!
//! - GET /api/v1/logs/filter - Filtered, sorted, paginated logs
//! - GET /api/v1/logs/recent - Newest logs by created_at

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::extractors::QueryParams;
use crate::api::types::{ApiError, FieldError, SuccessResponse};
use crate::data::TransactionalRepository;
use crate::data::filters::{FilterError, LogFilter, LogFilterParams};

use types::{FilteredLogsResponse, RecentLogsParams, RecentLogsResponse};

pub fn routes(repository: Arc<dyn TransactionalRepository>) -> Router<()> {
    Router::new()
        .route("/logs/filter", get(filter_logs))
        .route("/logs/recent", get(recent_logs))
        .with_state(repository)
}

impl From<FilterError> for ApiError {
    fn from(e: FilterError) -> Self {
        let message = e.to_string();
        ApiError::BadRequest {
            code: e.code().to_string(),
            details: vec![FieldError::new(e.field(), message.clone())],
            message,
        }
    }
}

/// Filter logs
#[utoipa::path(
    get,
    path = "/api/v1/logs/filter",
    tag = "logs",
    params(LogFilterParams),
    responses(
        (status = 200, body = SuccessResponse<FilteredLogsResponse>, description = "Matching page"),
        (status = 400, body = crate::api::types::ErrorBody, description = "Invalid enumeration or timestamp"),
        (status = 401, description = "Missing or invalid API key"),
    ),
    security(("api_key" = []))
)]
pub async fn filter_logs(
    State(repository): State<Arc<dyn TransactionalRepository>>,
    QueryParams(params): QueryParams<LogFilterParams>,
) -> Result<Json<SuccessResponse<FilteredLogsResponse>>, ApiError> {
    let filter = LogFilter::from_params(&params)?;

    let page = repository
        .query_logs(&filter)
        .await
        .map_err(|e| ApiError::from_data(e, "Failed to retrieve filtered logs"))?;

    let total_pages = filter.total_pages(page.total_count);
    tracing::debug!(
        predicates = filter.predicates.len(),
        total = page.total_count,
        page = filter.page,
        "Filtered logs"
    );

    Ok(Json(SuccessResponse::new(
        format!(
            "Retrieved {} filtered logs (page {} of {})",
            page.logs.len(),
            filter.page,
            total_pages
        ),
        FilteredLogsResponse {
            logs: page.logs,
            total_count: page.total_count,
            page: filter.page,
            page_size: filter.page_size,
            total_pages,
        },
    )))
}

/// Most recent logs
#[utoipa::path(
    get,
    path = "/api/v1/logs/recent",
    tag = "logs",
    params(RecentLogsParams),
    responses(
        (status = 200, body = SuccessResponse<RecentLogsResponse>, description = "Newest logs first"),
        (status = 401, description = "Missing or invalid API key"),
    ),
    security(("api_key" = []))
)]
pub async fn recent_logs(
    State(repository): State<Arc<dyn TransactionalRepository>>,
    QueryParams(params): QueryParams<RecentLogsParams>,
) -> Result<Json<SuccessResponse<RecentLogsResponse>>, ApiError> {
    let logs = repository
        .recent_logs(params.limit())
        .await
        .map_err(|e| ApiError::from_data(e, "Failed to retrieve recent logs"))?;

    Ok(Json(SuccessResponse::new(
        format!("Retrieved {} recent logs", logs.len()),
        RecentLogsResponse {
            count: logs.len(),
            logs,
        },
    )))
}
