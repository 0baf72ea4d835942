//! Authentication middleware

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::authenticator::{ApiKeyAuthError, ApiKeyAuthenticator, extract_api_key};

/// Require a valid API key on every request
///
/// Accepted requests carry an [`AuthenticatedKey`](super::AuthenticatedKey)
/// extension for handlers.
pub async fn require_api_key(
    State(auth): State<Arc<ApiKeyAuthenticator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiKeyAuthError> {
    let raw_key = extract_api_key(request.headers());

    let key = match auth.authenticate(raw_key.as_deref()).await {
        Ok(key) => key,
        Err(e) => {
            tracing::debug!(
                code = e.code(),
                path = %request.uri().path(),
                "API key rejected"
            );
            return Err(e);
        }
    };

    request.extensions_mut().insert(key);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TransactionalRepository;
    use crate::data::sqlite::test_service;
    use crate::utils::api_key::ApiKeyHasher;
    use axum::Router;
    use axum::body::Body;
    use axum::extract::Extension;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    use super::super::AuthenticatedKey;

    async fn app() -> Router {
        let service = test_service().await;
        let repo: Arc<dyn TransactionalRepository> = Arc::new(service);
        let auth = Arc::new(ApiKeyAuthenticator::new(repo, ApiKeyHasher::new(None).unwrap()));
        auth.bootstrap(&["secret-key".to_string()]).await.unwrap();

        Router::new()
            .route(
                "/protected",
                get(|Extension(key): Extension<AuthenticatedKey>| async move { key.key_hash }),
            )
            .layer(axum::middleware::from_fn_with_state(auth, require_api_key))
    }

    async fn status_for(app: Router, header: Option<(&str, &str)>) -> StatusCode {
        let mut builder = HttpRequest::builder().uri("/protected");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_rejects_missing_and_wrong_keys() {
        let app = app().await;
        assert_eq!(status_for(app.clone(), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(app.clone(), Some(("X-API-Key", "wrong"))).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(app.clone(), Some(("X-API-Key", "secret-key"))).await,
            StatusCode::OK
        );
        assert_eq!(
            status_for(app, Some(("Authorization", "Bearer secret-key"))).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_rejection_body() {
        let app = app().await;
        let response = app
            .oneshot(HttpRequest::builder().uri("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "unauthorized");
        assert_eq!(body["code"], "missing_api_key");
        assert_eq!(body["message"], "API key is required");
    }
}
