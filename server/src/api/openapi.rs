//! OpenAPI specification and Swagger UI

use axum::http::header;
use axum::response::{Html, IntoResponse, Json};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::routes::{health, ingest, logs, metrics};
use crate::api::types::{ErrorBody, FieldError};
use crate::core::constants::API_KEY_HEADER;
use crate::data::types::{EventTypeCount, LogMetrics, LogRow};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Log Ingestion API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Authenticated ingestion and querying of analytics events"
    ),
    modifiers(&ApiKeyAddon),
    tags(
        (name = "health", description = "Probes"),
        (name = "ingest", description = "Event ingestion"),
        (name = "logs", description = "Log queries"),
        (name = "metrics", description = "Metrics and status")
    ),
    paths(
        // Health
        health::health,
        health::readiness,
        health::liveness,
        // Ingest
        ingest::ingest_single,
        ingest::ingest_batch,
        // Logs
        logs::filter_logs,
        logs::recent_logs,
        // Metrics
        metrics::metrics,
        metrics::status,
    ),
    components(schemas(
        ErrorBody,
        FieldError,
        // Health
        health::HealthResponse,
        health::ReadinessResponse,
        health::LivenessResponse,
        // Ingest
        ingest::types::IngestLogRequest,
        ingest::types::BatchIngestRequest,
        ingest::types::IngestResponse,
        ingest::types::BatchIngestResponse,
        // Logs
        LogRow,
        logs::types::FilteredLogsResponse,
        logs::types::RecentLogsResponse,
        // Metrics
        LogMetrics,
        EventTypeCount,
        metrics::StatusResponse,
        metrics::ServiceStatus,
        metrics::DatabaseStatus,
    ))
)]
pub struct ApiDoc;

/// Registers the `api_key` security scheme referenced by protected paths
struct ApiKeyAddon;

impl Modify for ApiKeyAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
            );
        }
    }
}

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

/// Serve Swagger UI from CDN
pub async fn swagger_ui_html() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Log Ingestion API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        html { box-sizing: border-box; overflow-y: scroll; }
        *, *:before, *:after { box-sizing: inherit; }
        body { margin: 0; background: #fafafa; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({
                url: "/api/openapi.json",
                dom_id: '#swagger-ui',
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout",
                deepLinking: true,
                showExtensions: true,
                showCommonExtensions: true
            });
        };
    </script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes_and_scheme() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/health",
            "/api/v1/ingest",
            "/api/v1/batch-ingest",
            "/api/v1/logs/filter",
            "/api/v1/logs/recent",
            "/api/v1/metrics",
            "/api/v1/status",
        ] {
            assert!(paths.contains(&expected), "missing {}", expected);
        }
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("api_key"));
    }
}
