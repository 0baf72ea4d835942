//! Health, readiness and liveness probes
//!
//! Public endpoints, never rate limited or authenticated:
//! - GET /health - Store connectivity plus a trivial query
//! - GET /readiness - Whether the store answers
//! - GET /liveness - Process is up

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::ServiceInfo;
use crate::data::TransactionalService;

#[derive(Clone)]
pub struct HealthState {
    pub database: Arc<TransactionalService>,
    pub info: Arc<ServiceInfo>,
}

pub fn routes(database: Arc<TransactionalService>, info: Arc<ServiceInfo>) -> Router<()> {
    Router::new()
        .route("/health", get(health))
        .route("/readiness", get(readiness))
        .route("/liveness", get(liveness))
        .with_state(HealthState { database, info })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// healthy, degraded or unhealthy
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub services: BTreeMap<&'static str, &'static str>,
    pub uptime: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LivenessResponse {
    pub alive: bool,
    pub uptime: String,
    pub version: &'static str,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Store reachable and queryable", body = HealthResponse),
        (status = 206, description = "Store reachable but queries fail", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let mut services = BTreeMap::new();

    let (status, code) = if let Err(e) = state.database.ping().await {
        tracing::error!(error = %e, "Database health check failed");
        services.insert("database", "unhealthy");
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    } else {
        services.insert("database", "healthy");
        match state.database.repository().count_logs().await {
            Ok(_) => {
                services.insert("database_queries", "healthy");
                ("healthy", StatusCode::OK)
            }
            Err(e) => {
                tracing::error!(error = %e, "Database query health check failed");
                services.insert("database_queries", "unhealthy");
                ("degraded", StatusCode::PARTIAL_CONTENT)
            }
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            timestamp: Utc::now(),
            version: state.info.version,
            services,
            uptime: state.info.uptime(),
        }),
    )
}

/// Readiness probe
#[utoipa::path(
    get,
    path = "/readiness",
    tag = "health",
    responses(
        (status = 200, description = "Ready", body = ReadinessResponse),
        (status = 503, description = "Store not ready", body = ReadinessResponse)
    )
)]
pub async fn readiness(State(state): State<HealthState>) -> (StatusCode, Json<ReadinessResponse>) {
    match state.database.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                message: "Service is ready",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    ready: false,
                    message: "Database not ready",
                }),
            )
        }
    }
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/liveness",
    tag = "health",
    responses((status = 200, description = "Alive", body = LivenessResponse))
)]
pub async fn liveness(State(state): State<HealthState>) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        alive: true,
        uptime: state.info.uptime(),
        version: state.info.version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::{SqliteService, test_service};
    use axum::body::Body;
    use tower::ServiceExt;

    async fn setup() -> (Arc<SqliteService>, Router) {
        let service = test_service().await;
        let database = Arc::new(TransactionalService::Sqlite(Arc::clone(&service)));
        let router = routes(database, Arc::new(ServiceInfo::new("test")));
        (service, router)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_healthy() {
        let (_service, router) = setup().await;
        let (status, body) = get_json(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["services"]["database"], "healthy");
        assert_eq!(body["services"]["database_queries"], "healthy");
    }

    #[tokio::test]
    async fn test_degraded_when_queries_fail() {
        let (service, router) = setup().await;
        sqlx::query("DROP TABLE analytics_logs")
            .execute(service.pool())
            .await
            .unwrap();

        let (status, body) = get_json(router, "/health").await;
        assert_eq!(status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["services"]["database_queries"], "unhealthy");
    }

    #[tokio::test]
    async fn test_unhealthy_and_not_ready_when_store_closed() {
        let (service, router) = setup().await;
        service.close().await;

        let (status, body) = get_json(router.clone(), "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");

        let (status, body) = get_json(router.clone(), "/readiness").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ready"], false);
        assert_eq!(body["message"], "Database not ready");

        // Liveness never touches the store
        let (status, body) = get_json(router, "/liveness").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alive"], true);
    }
}
