//! SQLite SQL dialect implementation

use super::SqlDialect;

/// SQLite SQL dialect
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn json_text_path(&self, col: &str, path: &[&str]) -> String {
        // SQLite stores documents as JSON text
        format!("json_extract({}, '$.{}')", col, path.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.placeholder(1), "?");
        assert_eq!(dialect.placeholder(5), "?");
    }

    #[test]
    fn test_json_text_path() {
        let dialect = SqliteDialect;
        assert_eq!(
            dialect.json_text_path("properties", &["tags", "provider"]),
            "json_extract(properties, '$.tags.provider')"
        );
    }

    #[test]
    fn test_limit_offset() {
        assert_eq!(SqliteDialect.limit_offset(50, 100), "LIMIT 50 OFFSET 100");
    }
}
