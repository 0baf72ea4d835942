//! SQL dialect trait for multi-database support
//!
//! This trait defines the interface for generating database-specific SQL syntax.

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - Extracting text from nested JSON documents
/// - Limit/offset clauses
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Extract a nested JSON value as text
    ///
    /// Path segments are compile-time identifiers, never user input.
    ///
    /// - SQLite: `json_extract(col, '$.a.b')`
    /// - PostgreSQL: `col->'a'->>'b'`
    fn json_text_path(&self, col: &str, path: &[&str]) -> String;

    /// Generate LIMIT/OFFSET clause
    ///
    /// Both supported databases use `LIMIT x OFFSET y`.
    fn limit_offset(&self, limit: u32, offset: u64) -> String {
        format!("LIMIT {} OFFSET {}", limit, offset)
    }
}
