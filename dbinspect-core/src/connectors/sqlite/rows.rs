//! Statement execution and row decoding for SQLite.

use super::SqliteConnector;
use crate::Result;
use crate::connectors::helpers::map_sqlx_error;
use crate::models::{QueryParam, Row};
use crate::security::assert_read_only;
use base64::Engine;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as _};

/// Runs one guarded statement and decodes every row in column order.
pub async fn execute(connector: &SqliteConnector, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>> {
    assert_read_only(sql)?;
    let pool = connector.pool()?;

    tracing::debug!("SQLite query: {}", sql);

    let mut query = sqlx::query(sql);
    for param in params {
        query = match param {
            QueryParam::Null => query.bind(None::<String>),
            QueryParam::Bool(b) => query.bind(*b),
            QueryParam::Int(i) => query.bind(*i),
            QueryParam::Float(f) => query.bind(*f),
            QueryParam::Text(s) => query.bind(s.clone()),
        };
    }

    let rows = query
        .fetch_all(pool)
        .await
        .map_err(|e| map_sqlx_error("SQLite query failed", e))?;

    Ok(rows.iter().map(row_to_map).collect())
}

/// Converts a SQLite row to an ordered map keyed by column name.
pub fn row_to_map(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .map(|column| {
            let name = column.name();
            (name.to_string(), extract_column_value(row, name))
        })
        .collect()
}

/// Decodes one cell by trying the SQLite storage classes in turn.
///
/// BLOBs become `base64:`-prefixed strings; anything undecodable is NULL.
fn extract_column_value(row: &SqliteRow, column_name: &str) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(column_name) {
        return v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(column_name) {
        return v
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(column_name) {
        return v.map(Value::String).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(column_name) {
        return v
            .map(|bytes| {
                let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
                Value::String(format!("base64:{encoded}"))
            })
            .unwrap_or(Value::Null);
    }

    Value::Null
}
