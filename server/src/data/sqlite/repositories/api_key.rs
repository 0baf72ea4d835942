//! API key repository for SQLite operations

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::data::sqlite::SqliteError;
use crate::data::types::ApiKeyRecord;
use crate::utils::time::{datetime_to_micros, micros_to_datetime, now_micros};

const API_KEY_COLUMNS: &str =
    "id, key_hash, name, is_active, created_at, last_used_at, expires_at, usage_count";

/// Get API key by hash, whatever its active/expiry state
pub async fn get_by_hash(
    pool: &SqlitePool,
    key_hash: &str,
) -> Result<Option<ApiKeyRecord>, SqliteError> {
    let sql = format!("SELECT {} FROM api_keys WHERE key_hash = ?", API_KEY_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(key_hash)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(row_to_api_key).transpose()?)
}

/// Create a new active API key
pub async fn create_api_key(
    pool: &SqlitePool,
    key_hash: &str,
    name: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<ApiKeyRecord, SqliteError> {
    let now = now_micros();
    let id: i64 = sqlx::query_scalar(
        r#"INSERT INTO api_keys (key_hash, name, is_active, created_at, expires_at, usage_count)
           VALUES (?, ?, 1, ?, ?, 0)
           RETURNING id"#,
    )
    .bind(key_hash)
    .bind(name)
    .bind(now)
    .bind(expires_at.as_ref().map(datetime_to_micros))
    .fetch_one(pool)
    .await
    .map_err(|e| SqliteError::from_unique(e, || "API key already exists".to_string()))?;

    Ok(ApiKeyRecord {
        id,
        key_hash: key_hash.to_string(),
        name: name.to_string(),
        is_active: true,
        created_at: micros_to_datetime(now),
        last_used_at: None,
        expires_at,
        usage_count: 0,
    })
}

/// Bump usage counter and last-used timestamp
pub async fn touch_api_key(pool: &SqlitePool, key_hash: &str) -> Result<(), SqliteError> {
    sqlx::query(
        "UPDATE api_keys SET usage_count = usage_count + 1, last_used_at = ? WHERE key_hash = ?",
    )
    .bind(now_micros())
    .bind(key_hash)
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns false when no key has this hash
pub async fn set_active(
    pool: &SqlitePool,
    key_hash: &str,
    active: bool,
) -> Result<bool, SqliteError> {
    let result = sqlx::query("UPDATE api_keys SET is_active = ? WHERE key_hash = ?")
        .bind(active)
        .bind(key_hash)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn row_to_api_key(row: &SqliteRow) -> Result<ApiKeyRecord, sqlx::Error> {
    Ok(ApiKeyRecord {
        id: row.try_get("id")?,
        key_hash: row.try_get("key_hash")?,
        name: row.try_get("name")?,
        is_active: row.try_get("is_active")?,
        created_at: micros_to_datetime(row.try_get("created_at")?),
        last_used_at: row
            .try_get::<Option<i64>, _>("last_used_at")?
            .map(micros_to_datetime),
        expires_at: row
            .try_get::<Option<i64>, _>("expires_at")?
            .map(micros_to_datetime),
        usage_count: row.try_get("usage_count")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::test_service;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_get() {
        let service = test_service().await;
        let pool = service.pool();

        let expires = Utc::now() + Duration::days(30);
        let created = create_api_key(pool, "hash1", "ci", Some(expires))
            .await
            .unwrap();
        assert!(created.is_active);

        let fetched = get_by_hash(pool, "hash1").await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "ci");
        assert_eq!(fetched.usage_count, 0);
        assert!(fetched.last_used_at.is_none());
        assert_eq!(
            fetched.expires_at.map(|d| d.timestamp_micros()),
            Some(expires.timestamp_micros())
        );

        assert!(get_by_hash(pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_hash_conflicts() {
        let service = test_service().await;
        let pool = service.pool();

        create_api_key(pool, "dup", "a", None).await.unwrap();
        let err = create_api_key(pool, "dup", "b", None).await.unwrap_err();
        assert!(matches!(err, SqliteError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_touch_increments_usage() {
        let service = test_service().await;
        let pool = service.pool();

        create_api_key(pool, "h", "a", None).await.unwrap();
        touch_api_key(pool, "h").await.unwrap();
        touch_api_key(pool, "h").await.unwrap();

        let key = get_by_hash(pool, "h").await.unwrap().unwrap();
        assert_eq!(key.usage_count, 2);
        assert!(key.last_used_at.is_some());

        // Unknown hash is a no-op
        touch_api_key(pool, "nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_active() {
        let service = test_service().await;
        let pool = service.pool();

        create_api_key(pool, "h", "a", None).await.unwrap();
        assert!(set_active(pool, "h", false).await.unwrap());
        assert!(!get_by_hash(pool, "h").await.unwrap().unwrap().is_active);
        assert!(!set_active(pool, "unknown", false).await.unwrap());
    }
}
