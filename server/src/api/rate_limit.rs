//! Rate limiting middleware for API routes

use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::core::config::RateLimitConfig;
use crate::data::cache::{GLOBAL_IDENTIFIER, RateLimitBucket, RateLimitResult, RateLimiter};

/// Rate limit middleware state
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: RateLimiter,
    pub bucket: RateLimitBucket,
    pub key_extractor: KeyExtractor,
}

impl RateLimitState {
    pub fn from_config(limiter: RateLimiter, config: &RateLimitConfig) -> Self {
        Self {
            limiter,
            bucket: RateLimitBucket::api(config),
            key_extractor: if config.per_ip {
                KeyExtractor::IpAddress
            } else {
                KeyExtractor::Global
            },
        }
    }
}

/// How to extract rate limit key from request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExtractor {
    /// One budget shared by every client
    Global,
    /// Per client IP (X-Forwarded-For first, then the peer address)
    IpAddress,
}

/// Rate limit exceeded response
pub struct RateLimitExceeded(RateLimitResult);

impl IntoResponse for RateLimitExceeded {
    fn into_response(self) -> Response {
        let r = &self.0;
        let body = json!({
            "error": "too_many_requests",
            "code": "rate_limit_exceeded",
            "message": "Too many requests. Please slow down.",
        });

        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        let headers = response.headers_mut();
        add_rate_limit_headers(headers, r);
        headers.insert(
            header::RETRY_AFTER,
            HeaderValue::from(r.retry_after.unwrap_or(60)),
        );
        response
    }
}

/// Add rate limit headers to response
fn add_rate_limit_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    headers.insert("X-RateLimit-Limit", HeaderValue::from(result.limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(result.remaining));
    headers.insert("X-RateLimit-Reset", HeaderValue::from(result.reset_at));
}

/// Extract rate limit key based on configuration
fn extract_key(request: &Request, key_extractor: KeyExtractor) -> String {
    match key_extractor {
        KeyExtractor::Global => GLOBAL_IDENTIFIER.to_string(),
        KeyExtractor::IpAddress => {
            // Prefer X-Forwarded-For for proxied requests (first IP only)
            request
                .headers()
                .get("X-Forwarded-For")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .or_else(|| {
                    request
                        .extensions()
                        .get::<ConnectInfo<SocketAddr>>()
                        .map(|ConnectInfo(addr)| addr.ip().to_string())
                })
                .unwrap_or_else(|| "unknown".to_string())
        }
    }
}

/// Rate limiting middleware function
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitExceeded> {
    let key = extract_key(&request, state.key_extractor);
    let result = state.limiter.check(&state.bucket, &key);

    if !result.allowed {
        tracing::debug!(bucket = state.bucket.name, %key, "Rate limit exceeded");
        return Err(RateLimitExceeded(result));
    }

    let mut response = next.run(request).await;
    add_rate_limit_headers(response.headers_mut(), &result);
    Ok(response)
}
