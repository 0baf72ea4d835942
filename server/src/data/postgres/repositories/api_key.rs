//! API key repository for PostgreSQL operations

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::data::postgres::PostgresError;
use crate::data::types::ApiKeyRecord;
use crate::utils::time::{datetime_to_micros, micros_to_datetime, now_micros};

const API_KEY_COLUMNS: &str =
    "id, key_hash, name, is_active, created_at, last_used_at, expires_at, usage_count";

pub async fn get_by_hash(
    pool: &PgPool,
    key_hash: &str,
) -> Result<Option<ApiKeyRecord>, PostgresError> {
    let sql = format!(
        "SELECT {} FROM api_keys WHERE key_hash = $1",
        API_KEY_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(key_hash)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(row_to_api_key).transpose()?)
}

pub async fn create_api_key(
    pool: &PgPool,
    key_hash: &str,
    name: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<ApiKeyRecord, PostgresError> {
    let now = now_micros();
    let id: i64 = sqlx::query_scalar(
        r#"INSERT INTO api_keys (key_hash, name, is_active, created_at, expires_at, usage_count)
           VALUES ($1, $2, TRUE, $3, $4, 0)
           RETURNING id"#,
    )
    .bind(key_hash)
    .bind(name)
    .bind(now)
    .bind(expires_at.as_ref().map(datetime_to_micros))
    .fetch_one(pool)
    .await
    .map_err(|e| PostgresError::from_unique(e, || "API key already exists".to_string()))?;

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

pub async fn touch_api_key(pool: &PgPool, key_hash: &str) -> Result<(), PostgresError> {
    sqlx::query(
        "UPDATE api_keys SET usage_count = usage_count + 1, last_used_at = $1 WHERE key_hash = $2",
    )
    .bind(now_micros())
    .bind(key_hash)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_active(
    pool: &PgPool,
    key_hash: &str,
    active: bool,
) -> Result<bool, PostgresError> {
    let result = sqlx::query("UPDATE api_keys SET is_active = $1 WHERE key_hash = $2")
        .bind(active)
        .bind(key_hash)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn row_to_api_key(row: &PgRow) -> Result<ApiKeyRecord, sqlx::Error> {
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
