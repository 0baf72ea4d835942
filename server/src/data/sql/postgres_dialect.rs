//! PostgreSQL SQL dialect implementation

use super::SqlDialect;

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn json_text_path(&self, col: &str, path: &[&str]) -> String {
        match path.split_last() {
            Some((last, parents)) => {
                let mut expr = col.to_string();
                for segment in parents {
                    expr.push_str(&format!("->'{}'", segment));
                }
                format!("{}->>'{}'", expr, last)
            }
            None => format!("{}::TEXT", col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.placeholder(1), "$1");
        assert_eq!(dialect.placeholder(12), "$12");
    }

    #[test]
    fn test_json_text_path() {
        let dialect = PostgresDialect;
        assert_eq!(
            dialect.json_text_path("properties", &["tags", "provider"]),
            "properties->'tags'->>'provider'"
        );
        assert_eq!(
            dialect.json_text_path("device_info", &["os"]),
            "device_info->>'os'"
        );
    }
}
