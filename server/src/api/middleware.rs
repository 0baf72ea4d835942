//! HTTP middleware (CORS, security headers, request ids, size limit, fallbacks)

use std::any::Any;

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use super::types::ApiError;
use crate::core::config::CorsConfig;
use crate::core::constants::REQUEST_ID_HEADER;

/// Response headers added to every response
pub const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
];

/// Request id generator (UUID v4)
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static(REQUEST_ID_HEADER)
}

/// Create CORS layer
///
/// `*` in the origin list allows any origin; credentials are only allowed
/// with an explicit list.
pub fn cors(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
            request_id_header(),
        ])
        .expose_headers([header::CONTENT_LENGTH, request_id_header()])
        .max_age(std::time::Duration::from_secs(12 * 60 * 60));

    if config.allows_any_origin() {
        layer.allow_origin(AnyOrigin)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}

/// Reject bodies whose declared length exceeds the limit
///
/// Chunked bodies are caught later by the body limit layer.
pub async fn limit_request_size(
    State(max_mb): State<usize>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if declared.is_some_and(|len| len > max_mb.saturating_mul(1024 * 1024)) {
        return Err(ApiError::payload_too_large(format!(
            "Request body too large. Maximum size is {} MB",
            max_mb
        )));
    }
    Ok(next.run(request).await)
}

/// Handle 404 Not Found
pub async fn handle_404(req: Request) -> ApiError {
    tracing::debug!(method = %req.method(), uri = %req.uri(), "No route");
    ApiError::not_found("not_found", format!("No route for {} {}", req.method(), req.uri().path()))
}

/// Render a handler panic as a JSON 500
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");
    ApiError::internal("internal_server_error", "An unexpected error occurred").into_response()
}
