//! SQL Extractor
//!
//! Recovers a SQL statement from free-form model output. This is a
//! best-effort heuristic: it never parses SQL and may hand back prose or a
//! partial statement, which then fails at execution time.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Fenced block opened by ```sql, lazily closed by the next fence.
    static ref FENCED_SQL: Regex = Regex::new(r"(?s)```sql(.*?)```").unwrap();

    /// First statement keyword through the first semicolon after it.
    static ref STATEMENT: Regex =
        Regex::new(r"(?is)(SELECT|INSERT|UPDATE|DELETE|CREATE|ALTER|DROP).*?;").unwrap();
}

/// Extract the SQL statement from model output.
///
/// Order: fenced ```sql block, then keyword-to-semicolon span, then the
/// whole input. Always returns a trimmed string.
pub fn extract_sql(model_output: &str) -> String {
    if let Some(caps) = FENCED_SQL.captures(model_output) {
        if let Some(body) = caps.get(1) {
            return body.as_str().trim().to_string();
        }
    }

    if let Some(m) = STATEMENT.find(model_output) {
        return m.as_str().trim().to_string();
    }

    model_output.trim().to_string()
}
