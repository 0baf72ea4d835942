//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::auth::require_api_key;
use super::middleware::{self, MakeRequestUuid, SECURITY_HEADERS, request_id_header};
use super::openapi::{openapi_json, swagger_ui_html};
use super::rate_limit::{RateLimitState, rate_limit_middleware};
use super::routes::{health, ingest, logs, metrics};
use crate::core::CoreApp;

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let app = self.app;
        let shutdown = app.shutdown.clone();

        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);
        let router = build_router(&app);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, environment = %app.config.server.environment, "Server listening");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}

/// Assemble public probes, protected API routes and global middleware
pub fn build_router(app: &CoreApp) -> Router {
    let config = &app.config;
    let repository = app.database.repository();

    // Protected routes: rate limit, then API key, then handler
    let api_routes = Router::new()
        .merge(ingest::routes(
            Arc::clone(&repository),
            config.ingest.max_batch_size,
        ))
        .merge(logs::routes(repository))
        .merge(metrics::routes(
            Arc::clone(&app.database),
            Arc::clone(&app.info),
        ))
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&app.authenticator),
            require_api_key,
        ));
    let api_routes = if config.rate_limit.enabled {
        api_routes.layer(axum::middleware::from_fn_with_state(
            RateLimitState::from_config(app.rate_limiter.clone(), &config.rate_limit),
            rate_limit_middleware,
        ))
    } else {
        api_routes
    };

    let mut router = Router::new()
        .merge(health::routes(
            Arc::clone(&app.database),
            Arc::clone(&app.info),
        ))
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/docs", get(swagger_ui_html))
        .nest("/api/v1", api_routes)
        .fallback(middleware::handle_404)
        .layer(CatchPanicLayer::custom(middleware::handle_panic))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes()))
        .layer(axum::middleware::from_fn_with_state(
            config.server.max_request_size_mb,
            middleware::limit_request_size,
        ))
        .layer(CompressionLayer::new());

    if config.cors.enabled {
        router = router.layer(middleware::cors(&config.cors));
    }
    for (name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    router
        .layer(PropagateRequestIdLayer::new(request_id_header()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuid))
}
