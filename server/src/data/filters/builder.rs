//! SQL filter builder
//!
//! Compiles a `LogFilter` into a count query and a page query that share one
//! WHERE clause and one parameter list.

use super::types::{LogFilter, Predicate, SortColumn, SqlParams};
use crate::data::sql::SqlDialect;

/// Table holding ingested events
pub const LOGS_TABLE: &str = "analytics_logs";

/// Column list selected for `LogRow`
pub const LOG_COLUMNS: &str = "id, event_id, timestamp, event_type, event_name, properties, \
     user_id, session_id, app_version, device_info, sequence_number, priority, created_at, \
     processed_at";

/// Compiled count and page statements plus their shared parameters
#[derive(Debug, Clone)]
pub struct LogQuery {
    pub count_sql: String,
    pub page_sql: String,
    pub params: SqlParams,
}

/// Render predicates as a conjunctive WHERE clause (empty when there are none)
pub fn build_where_clause(
    predicates: &[Predicate],
    dialect: &dyn SqlDialect,
    params: &mut SqlParams,
) -> String {
    if predicates.is_empty() {
        return String::new();
    }
    let conditions: Vec<String> = predicates
        .iter()
        .map(|p| p.to_sql(dialect, params))
        .collect();
    format!("WHERE {}", conditions.join(" AND "))
}

/// ORDER BY with an `id` tie-breaker in the same direction
pub fn build_order_clause(filter: &LogFilter) -> String {
    let dir = filter.sort_order.as_sql();
    match filter.sort_by {
        SortColumn::Id => format!("ORDER BY id {}", dir),
        column => format!("ORDER BY {} {}, id {}", column.as_str(), dir, dir),
    }
}

/// Compile a filter into count and page queries
pub fn build_log_query(filter: &LogFilter, dialect: &dyn SqlDialect) -> LogQuery {
    let mut params = SqlParams::default();
    let where_clause = build_where_clause(&filter.predicates, dialect, &mut params);

    let count_sql = join_sql(&[
        &format!("SELECT COUNT(*) FROM {}", LOGS_TABLE),
        &where_clause,
    ]);
    let page_sql = join_sql(&[
        &format!("SELECT {} FROM {}", LOG_COLUMNS, LOGS_TABLE),
        &where_clause,
        &build_order_clause(filter),
        &dialect.limit_offset(filter.page_size, filter.offset()),
    ]);

    LogQuery {
        count_sql,
        page_sql,
        params,
    }
}

fn join_sql(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filters::{LogFilterParams, SortOrder, SqlValue};
    use crate::data::sql::{PostgresDialect, SqliteDialect};

    fn filter(params: LogFilterParams) -> LogFilter {
        LogFilter::from_params(&params).unwrap()
    }

    #[test]
    fn test_no_predicates() {
        let query = build_log_query(&LogFilter::default(), &SqliteDialect);
        assert_eq!(query.count_sql, "SELECT COUNT(*) FROM analytics_logs");
        assert!(query.page_sql.ends_with(
            "FROM analytics_logs ORDER BY created_at DESC, id DESC LIMIT 50 OFFSET 0"
        ));
        assert!(query.params.values.is_empty());
    }

    #[test]
    fn test_postgres_placeholders_are_positional() {
        let f = filter(LogFilterParams {
            event_type: Some("behavioral".to_string()),
            user_id: Some("u1".to_string()),
            provider_name: Some("openai".to_string()),
            ..Default::default()
        });
        let query = build_log_query(&f, &PostgresDialect);
        assert_eq!(
            query.count_sql,
            "SELECT COUNT(*) FROM analytics_logs WHERE event_type = $1 AND user_id = $2 \
             AND properties->'tags'->>'provider' = $3"
        );
        assert_eq!(
            query.params.values,
            vec![
                SqlValue::Text("behavioral".to_string()),
                SqlValue::Text("u1".to_string()),
                SqlValue::Text("openai".to_string()),
            ]
        );
    }

    #[test]
    fn test_count_and_page_share_where_clause() {
        let f = filter(LogFilterParams {
            event_name: Some("x".to_string()),
            start_time: Some("2024-01-01T00:00:00Z".to_string()),
            page: Some("2".to_string()),
            page_size: Some("10".to_string()),
            ..Default::default()
        });
        let query = build_log_query(&f, &SqliteDialect);
        let where_clause = "WHERE event_name = ? AND created_at >= ?";
        assert!(query.count_sql.ends_with(where_clause));
        assert!(query.page_sql.contains(where_clause));
        assert!(query.page_sql.ends_with("LIMIT 10 OFFSET 10"));
    }

    #[test]
    fn test_values_never_interpolated() {
        let hostile = "x' OR '1'='1";
        let f = filter(LogFilterParams {
            event_name: Some(hostile.to_string()),
            sort_by: Some("robert'); drop table logs;--".to_string()),
            ..Default::default()
        });
        let query = build_log_query(&f, &SqliteDialect);
        assert!(!query.page_sql.contains(hostile));
        assert!(!query.page_sql.contains("drop table"));
        assert!(query.page_sql.contains("ORDER BY created_at DESC"));
    }

    #[test]
    fn test_order_clause() {
        let mut f = LogFilter {
            sort_by: SortColumn::Id,
            sort_order: SortOrder::Asc,
            ..LogFilter::default()
        };
        assert_eq!(build_order_clause(&f), "ORDER BY id ASC");
        f.sort_by = SortColumn::EventName;
        assert_eq!(build_order_clause(&f), "ORDER BY event_name ASC, id ASC");
    }
}
