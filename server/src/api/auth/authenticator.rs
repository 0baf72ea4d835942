//! API key validation
//!
//! Cache-aside over the key store: hashes confirmed valid are kept in an
//! in-process [`ApiKeyCache`]; misses go to the store. Usage accounting is
//! spawned and never awaited by the request path.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::cache::ApiKeyCache;
use crate::core::constants::{API_KEY_HEADER, AUTH_CACHE_STALENESS_SECS};
use crate::data::{DataError, TransactionalRepository};
use crate::data::types::ApiKeyRecord;
use crate::utils::api_key::{ApiKeyHasher, extract_key_from_header, generate_api_key};

/// API key authentication error
#[derive(Debug, Error)]
pub enum ApiKeyAuthError {
    /// Neither credential header present
    #[error("API key is required")]
    Missing,
    /// No key with this hash
    #[error("Invalid or inactive API key")]
    InvalidKey,
    /// Key exists but was revoked
    #[error("Invalid or inactive API key")]
    Inactive,
    #[error("API key has expired")]
    Expired,
    /// Store lookup failed
    #[error("Failed to validate API key")]
    Store(#[source] DataError),
}

impl ApiKeyAuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing => "missing_api_key",
            Self::InvalidKey | Self::Inactive => "invalid_api_key",
            Self::Expired => "expired_api_key",
            Self::Store(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiKeyAuthError {
    fn into_response(self) -> Response {
        let error = match self {
            Self::Store(_) => "internal_error",
            _ => "unauthorized",
        };
        let body = json!({
            "error": error,
            "code": self.code(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Identity of an accepted request, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedKey {
    pub key_hash: String,
    /// Accepted from the in-process cache without a store lookup
    pub from_cache: bool,
}

/// Raw key from `Authorization` (Bearer or bare), then `X-API-Key`
pub fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_key_from_header)
        .or_else(|| {
            headers
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
        })
}

pub struct ApiKeyAuthenticator {
    repository: Arc<dyn TransactionalRepository>,
    hasher: ApiKeyHasher,
    cache: ApiKeyCache,
}

impl ApiKeyAuthenticator {
    pub fn new(repository: Arc<dyn TransactionalRepository>, hasher: ApiKeyHasher) -> Self {
        Self {
            repository,
            hasher,
            cache: ApiKeyCache::new(Duration::from_secs(AUTH_CACHE_STALENESS_SECS)),
        }
    }

    pub fn cache(&self) -> &ApiKeyCache {
        &self.cache
    }

    pub fn hash(&self, raw_key: &str) -> String {
        self.hasher.hash(raw_key)
    }

    /// Register configured keys and seed the cache
    ///
    /// Keys already in the store are left untouched, so repeated runs create
    /// nothing new. Returns the number of keys created.
    pub async fn bootstrap(&self, raw_keys: &[String]) -> Result<usize, DataError> {
        let mut created = 0;
        for raw_key in raw_keys {
            let key_hash = self.hasher.hash(raw_key);

            if self
                .repository
                .get_api_key_by_hash(&key_hash)
                .await?
                .is_none()
            {
                let name = format!("Auto-generated key {}", Utc::now().format("%Y-%m-%d"));
                match self.repository.create_api_key(&key_hash, &name, None).await {
                    Ok(_) => {
                        created += 1;
                        tracing::info!(%name, "Created API key");
                    }
                    // Another instance registered it first
                    Err(e) if e.is_conflict() => {}
                    Err(e) => return Err(e),
                }
            }

            self.cache.insert(key_hash);
        }
        self.cache.refresh();
        Ok(created)
    }

    /// Accept or reject a raw key
    pub async fn authenticate(
        &self,
        raw_key: Option<&str>,
    ) -> Result<AuthenticatedKey, ApiKeyAuthError> {
        let raw_key = raw_key.ok_or(ApiKeyAuthError::Missing)?;
        let key_hash = self.hasher.hash(raw_key);

        if self.cache.contains(&key_hash) {
            self.record_usage(&key_hash);
            return Ok(AuthenticatedKey {
                key_hash,
                from_cache: true,
            });
        }

        let record = self
            .repository
            .get_api_key_by_hash(&key_hash)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "API key lookup failed");
                ApiKeyAuthError::Store(e)
            })?
            .ok_or(ApiKeyAuthError::InvalidKey)?;

        check_record(&record, Utc::now())?;

        self.cache.insert(key_hash.clone());
        self.record_usage(&key_hash);
        Ok(AuthenticatedKey {
            key_hash,
            from_cache: false,
        })
    }

    /// Spawn a usage increment; failures are logged only
    pub fn record_usage(&self, key_hash: &str) {
        let repository = Arc::clone(&self.repository);
        let key_hash = key_hash.to_string();
        tokio::spawn(async move {
            if let Err(e) = repository.record_api_key_usage(&key_hash).await {
                tracing::warn!(error = %e, "Failed to update API key usage");
            }
        });
    }

    /// Create a new active key; returns the raw key (shown once) and its record
    pub async fn generate(
        &self,
        name: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(String, ApiKeyRecord), DataError> {
        let raw_key = generate_api_key();
        let key_hash = self.hasher.hash(&raw_key);
        let record = self
            .repository
            .create_api_key(&key_hash, name, expires_at)
            .await?;
        self.cache.insert(key_hash);
        Ok((raw_key, record))
    }

    /// Deactivate a key and evict it from the cache
    pub async fn revoke(&self, key_hash: &str) -> Result<bool, DataError> {
        let found = self.repository.set_api_key_active(key_hash, false).await?;
        self.cache.remove(key_hash);
        Ok(found)
    }

    /// Periodically reset the cache staleness clock
    pub fn start_refresh_task(
        self: &Arc<Self>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let auth = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(AUTH_CACHE_STALENESS_SECS));
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("API key cache refresh task shutting down");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        if auth.cache.is_stale() {
                            auth.cache.refresh();
                        }
                    }
                }
            }
        })
    }
}

fn check_record(record: &ApiKeyRecord, now: DateTime<Utc>) -> Result<(), ApiKeyAuthError> {
    if !record.is_active {
        return Err(ApiKeyAuthError::Inactive);
    }
    if record.is_expired(now) {
        return Err(ApiKeyAuthError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ApiKeyRepository;
    use crate::data::sqlite::{SqliteService, test_service};
    use axum::http::HeaderValue;
    use chrono::Duration as ChronoDuration;

    async fn setup() -> (Arc<SqliteService>, ApiKeyAuthenticator) {
        let service = test_service().await;
        let repo: Arc<dyn TransactionalRepository> = Arc::new(Arc::clone(&service));
        let auth = ApiKeyAuthenticator::new(repo, ApiKeyHasher::new(None).unwrap());
        (service, auth)
    }

    async fn usage_count(service: &Arc<SqliteService>, key_hash: &str) -> i64 {
        service
            .get_api_key_by_hash(key_hash)
            .await
            .unwrap()
            .map(|k| k.usage_count)
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let (service, auth) = setup().await;
        let keys = vec!["key-one".to_string(), "key-two".to_string()];

        assert_eq!(auth.bootstrap(&keys).await.unwrap(), 2);
        assert_eq!(auth.bootstrap(&keys).await.unwrap(), 0);
        assert_eq!(auth.cache().len(), 2);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_keys")
            .fetch_one(service.pool())
            .await
            .unwrap();
        assert_eq!(count, 2);

        let record = service
            .get_api_key_by_hash(&auth.hash("key-one"))
            .await
            .unwrap()
            .unwrap();
        assert!(record.name.starts_with("Auto-generated key "));
        assert!(record.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_missing_and_unknown_keys_rejected() {
        let (_service, auth) = setup().await;
        auth.bootstrap(&["right".to_string()]).await.unwrap();

        assert!(matches!(
            auth.authenticate(None).await,
            Err(ApiKeyAuthError::Missing)
        ));
        assert!(matches!(
            auth.authenticate(Some("wrong")).await,
            Err(ApiKeyAuthError::InvalidKey)
        ));
        let accepted = auth.authenticate(Some("right")).await.unwrap();
        assert!(accepted.from_cache);
    }

    #[tokio::test]
    async fn test_expired_key_never_cached() {
        let (service, auth) = setup().await;
        let hash = auth.hash("old");
        service
            .create_api_key(&hash, "old", Some(Utc::now() - ChronoDuration::hours(1)))
            .await
            .unwrap();

        for _ in 0..2 {
            assert!(matches!(
                auth.authenticate(Some("old")).await,
                Err(ApiKeyAuthError::Expired)
            ));
        }
        assert!(!auth.cache().contains(&hash));
    }

    #[tokio::test]
    async fn test_inactive_key_rejected() {
        let (service, auth) = setup().await;
        let hash = auth.hash("revoked");
        service.create_api_key(&hash, "r", None).await.unwrap();
        service.set_api_key_active(&hash, false).await.unwrap();

        let err = auth.authenticate(Some("revoked")).await.unwrap_err();
        assert!(matches!(err, ApiKeyAuthError::Inactive));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_key_served_from_cache_after_first_lookup() {
        let (service, auth) = setup().await;
        let hash = auth.hash("fresh");
        service
            .create_api_key(&hash, "fresh", Some(Utc::now() + ChronoDuration::days(1)))
            .await
            .unwrap();

        let first = auth.authenticate(Some("fresh")).await.unwrap();
        assert!(!first.from_cache);

        // Store is gone; the cached hash still authenticates
        service.close().await;
        let second = auth.authenticate(Some("fresh")).await.unwrap();
        assert!(second.from_cache);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_error() {
        let (service, auth) = setup().await;
        service.close().await;

        let err = auth.authenticate(Some("anything")).await.unwrap_err();
        assert!(matches!(err, ApiKeyAuthError::Store(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "internal_error");
    }

    #[tokio::test]
    async fn test_usage_recorded_in_background() {
        let (service, auth) = setup().await;
        auth.bootstrap(&["k".to_string()]).await.unwrap();
        let hash = auth.hash("k");

        auth.authenticate(Some("k")).await.unwrap();

        let mut count = 0;
        for _ in 0..50 {
            count = usage_count(&service, &hash).await;
            if count > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_generate_and_revoke() {
        let (_service, auth) = setup().await;

        let (raw, record) = auth.generate("ci", None).await.unwrap();
        assert!(raw.starts_with("ik_"));
        assert_eq!(record.key_hash, auth.hash(&raw));
        assert!(auth.cache().contains(&record.key_hash));

        assert!(auth.revoke(&record.key_hash).await.unwrap());
        assert!(!auth.cache().contains(&record.key_hash));
        assert!(matches!(
            auth.authenticate(Some(&raw)).await,
            Err(ApiKeyAuthError::Inactive)
        ));
        assert!(!auth.revoke("unknown").await.unwrap());
    }

    #[test]
    fn test_extract_api_key_prefers_authorization() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_api_key(&headers), None);

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("from-header"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("from-header"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("tok"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("from-header"));
    }

    #[tokio::test]
    async fn test_refresh_task_stops_on_shutdown() {
        let (_service, auth) = setup().await;
        let auth = Arc::new(auth);
        let (tx, rx) = watch::channel(false);
        let handle = auth.start_refresh_task(rx);
        tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
