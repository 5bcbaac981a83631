//! Helper utilities shared by connector implementations and the engines
//! that read their rows.

use crate::models::Row;
use serde_json::Value;

/// Extension trait for reading loosely typed values out of result rows.
///
/// Backends disagree on how they return numbers (JSON numbers, numeric
/// strings, booleans as 0/1), so every getter accepts the reasonable
/// encodings and returns `None` for NULL or unusable values.
///
/// # Example
/// ```rust
/// use dbinspect_core::connectors::helpers::RowExt;
/// use dbinspect_core::Row;
///
/// let mut row = Row::new();
/// row.insert("c".to_string(), serde_json::json!("42"));
/// assert_eq!(row.get_u64("c"), Some(42));
/// ```
pub trait RowExt {
    /// Raw value, `None` when absent or NULL.
    fn value(&self, key: &str) -> Option<&Value>;

    /// Unsigned integer from a number or numeric string.
    fn get_u64(&self, key: &str) -> Option<u64> {
        match self.value(key)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            Value::Bool(b) => Some(u64::from(*b)),
            _ => None,
        }
    }

    /// Float from a number or numeric string.
    fn get_f64(&self, key: &str) -> Option<f64> {
        match self.value(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Text value; numbers and booleans are stringified.
    fn get_string(&self, key: &str) -> Option<String> {
        self.value(key).map(stringify)
    }

    /// Boolean from a bool, 0/1 number or `YES`/`TRUE`/`1` string.
    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.value(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim().to_ascii_uppercase().as_str() {
                "YES" | "TRUE" | "T" | "1" | "Y" => Some(true),
                "NO" | "FALSE" | "F" | "0" | "N" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl RowExt for Row {
    fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|v| !v.is_null())
    }
}

/// Renders a JSON value the way it should appear in reports: strings
/// without quotes, everything else in its JSON form.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

/// Lower-cases every key of a row, keeping column order.
pub fn lowercase_keys(row: Row) -> Row {
    row.into_iter()
        .map(|(key, value)| (key.to_lowercase(), value))
        .collect()
}

/// Translates a driver error raised while running a statement.
///
/// Transport-level failures mean the session is gone and become
/// `Connection`; everything else is a `QueryExecution` on a live session.
#[cfg(any(feature = "sqlite", feature = "postgresql"))]
pub fn map_sqlx_error(context: &str, error: sqlx::Error) -> crate::error::DbInspectError {
    use crate::error::DbInspectError;

    match error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => DbInspectError::connection_failed(
            format!("{context}: the database session is no longer available"),
            error,
        ),
        sqlx::Error::Database(ref db_error) => {
            let message = db_error.message().to_string();
            DbInspectError::query_failed_with(format!("{context}: {message}"), error)
        }
        other => DbInspectError::query_failed_with(context.to_string(), other),
    }
}
