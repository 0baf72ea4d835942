//! Log repository for PostgreSQL operations

use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::types::Json;
use sqlx::{Arguments, Executor, PgPool, Postgres, Row};

use crate::core::constants::{ACTIVE_SESSION_WINDOW_MINUTES, METRICS_TOP_EVENT_TYPES};
use crate::data::filters::{LOG_COLUMNS, LogFilter, SqlParams, SqlValue, build_log_query};
use crate::data::postgres::PostgresError;
use crate::data::sql::PostgresDialect;
use crate::data::types::{EventTypeCount, InsertedLog, LogMetrics, LogPage, LogRow, NewLog};
use crate::utils::time::{datetime_to_micros, micros_to_datetime, now_micros};

const INSERT_LOG: &str = r#"INSERT INTO analytics_logs (
        event_id, timestamp, event_type, event_name, properties, user_id, session_id,
        app_version, device_info, sequence_number, priority, created_at
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
    RETURNING id"#;

pub async fn insert_log(pool: &PgPool, log: &NewLog) -> Result<InsertedLog, PostgresError> {
    let created_at = now_micros();
    let id = insert_row(pool, log, created_at)
        .await
        .map_err(|e| PostgresError::from_unique(e, || duplicate_message(&log.event_id)))?;

    Ok(InsertedLog {
        id,
        created_at: micros_to_datetime(created_at),
    })
}

/// Insert all events in one transaction
pub async fn insert_logs_batch(
    pool: &PgPool,
    logs: &[NewLog],
) -> Result<Vec<InsertedLog>, PostgresError> {
    if logs.is_empty() {
        return Ok(Vec::new());
    }

    let mut tx = pool.begin().await?;
    let mut inserted = Vec::with_capacity(logs.len());

    for log in logs {
        let created_at = now_micros();
        let id = insert_row(&mut *tx, log, created_at)
            .await
            .map_err(|e| PostgresError::from_unique(e, || duplicate_message(&log.event_id)))?;
        inserted.push(InsertedLog {
            id,
            created_at: micros_to_datetime(created_at),
        });
    }

    tx.commit().await?;
    Ok(inserted)
}

pub async fn query_logs(pool: &PgPool, filter: &LogFilter) -> Result<LogPage, PostgresError> {
    let query = build_log_query(filter, &PostgresDialect);

    let total_count: i64 =
        sqlx::query_scalar_with(&query.count_sql, bind_params(&query.params)?)
            .fetch_one(pool)
            .await?;

    let rows = sqlx::query_with(&query.page_sql, bind_params(&query.params)?)
        .fetch_all(pool)
        .await?;
    let logs = rows.iter().map(row_to_log).collect::<Result<Vec<_>, _>>()?;

    Ok(LogPage { logs, total_count })
}

pub async fn recent_logs(pool: &PgPool, limit: u32) -> Result<Vec<LogRow>, PostgresError> {
    let sql = format!(
        "SELECT {} FROM analytics_logs ORDER BY created_at DESC, id DESC LIMIT $1",
        LOG_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(row_to_log).collect::<Result<Vec<_>, _>>()?)
}

pub async fn count_logs(pool: &PgPool) -> Result<i64, PostgresError> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM analytics_logs")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn log_metrics(pool: &PgPool, now: DateTime<Utc>) -> Result<LogMetrics, PostgresError> {
    let hour_ago = datetime_to_micros(&(now - Duration::hours(1)));
    let day_ago = datetime_to_micros(&(now - Duration::days(1)));
    let session_cutoff =
        datetime_to_micros(&(now - Duration::minutes(ACTIVE_SESSION_WINDOW_MINUTES)));

    let (total_logs, logs_last_hour, logs_last_day, active_sessions): (i64, i64, i64, i64) =
        sqlx::query_as(
            r#"SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE created_at >= $1),
                COUNT(*) FILTER (WHERE created_at >= $2),
                COUNT(DISTINCT session_id) FILTER (WHERE created_at >= $3)
               FROM analytics_logs"#,
        )
        .bind(hour_ago)
        .bind(day_ago)
        .bind(session_cutoff)
        .fetch_one(pool)
        .await?;

    let top_event_types = sqlx::query_as::<_, (String, i64)>(
        r#"SELECT event_type, COUNT(*) AS count
           FROM analytics_logs
           WHERE created_at >= $1
           GROUP BY event_type
           ORDER BY count DESC, event_type ASC
           LIMIT $2"#,
    )
    .bind(day_ago)
    .bind(METRICS_TOP_EVENT_TYPES)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(event_type, count)| EventTypeCount { event_type, count })
    .collect();

    Ok(LogMetrics {
        total_logs,
        logs_last_hour,
        logs_last_day,
        active_sessions,
        top_event_types,
    })
}

async fn insert_row<'e, E>(executor: E, log: &NewLog, created_at: i64) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(INSERT_LOG)
        .bind(&log.event_id)
        .bind(datetime_to_micros(&log.timestamp))
        .bind(log.event_type.as_str())
        .bind(&log.event_name)
        .bind(Json(&log.properties))
        .bind(&log.user_id)
        .bind(&log.session_id)
        .bind(&log.app_version)
        .bind(Json(&log.device_info))
        .bind(log.sequence_number)
        .bind(log.priority.as_str())
        .bind(created_at)
        .fetch_one(executor)
        .await
}

fn duplicate_message(event_id: &str) -> String {
    format!("Event with ID '{}' already exists", event_id)
}

fn bind_params(params: &SqlParams) -> Result<PgArguments, sqlx::Error> {
    let mut args = PgArguments::default();
    for value in &params.values {
        match value {
            SqlValue::Text(s) => args.add(s.clone()),
            SqlValue::Int(i) => args.add(*i),
        }
        .map_err(sqlx::Error::Encode)?;
    }
    Ok(args)
}

fn row_to_log(row: &PgRow) -> Result<LogRow, sqlx::Error> {
    Ok(LogRow {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        timestamp: micros_to_datetime(row.try_get("timestamp")?),
        event_type: row.try_get("event_type")?,
        event_name: row.try_get("event_name")?,
        properties: row.try_get("properties")?,
        user_id: row.try_get("user_id")?,
        session_id: row.try_get("session_id")?,
        app_version: row.try_get("app_version")?,
        device_info: row.try_get("device_info")?,
        sequence_number: row.try_get("sequence_number")?,
        priority: row.try_get("priority")?,
        created_at: micros_to_datetime(row.try_get("created_at")?),
        processed_at: row
            .try_get::<Option<i64>, _>("processed_at")?
            .map(micros_to_datetime),
    })
}
