//! Statement execution for PostgreSQL.
//!
//! Query statements are wrapped in `row_to_json` so the server does the
//! type conversion and key order follows the select list. Other statements
//! (`SHOW`, `EXPLAIN`) return text columns and are decoded as text.

use super::PostgresConnector;
use crate::Result;
use crate::connectors::helpers::map_sqlx_error;
use crate::models::{QueryParam, Row};
use crate::security::{assert_read_only, leading_keyword};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _};

const JSON_COLUMN: &str = "row_data";

/// Runs one guarded statement.
pub async fn execute(connector: &PostgresConnector, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>> {
    assert_read_only(sql)?;
    let pool = connector.pool()?;

    tracing::debug!("PostgreSQL query: {}", sql);

    match wrap_for_json(sql) {
        Some(wrapped) => {
            let rows = bind_all(sqlx::query(&wrapped), params)
                .fetch_all(pool)
                .await
                .map_err(|e| map_sqlx_error("PostgreSQL query failed", e))?;
            Ok(rows.iter().map(json_row).collect())
        }
        None => {
            let rows = bind_all(sqlx::query(sql), params)
                .fetch_all(pool)
                .await
                .map_err(|e| map_sqlx_error("PostgreSQL query failed", e))?;
            Ok(rows.iter().map(text_row).collect())
        }
    }
}

/// Wraps a SELECT/WITH/VALUES statement so each row comes back as one JSON
/// object. Returns `None` for statements that cannot be used as a subquery.
pub(crate) fn wrap_for_json(sql: &str) -> Option<String> {
    let keyword = leading_keyword(sql)?;
    if !matches!(keyword.as_str(), "SELECT" | "WITH" | "VALUES") {
        return None;
    }
    let body = sql.trim().trim_end_matches(';').trim_end();
    // Body on its own lines so a trailing line comment cannot swallow the
    // closing parenthesis
    Some(format!(
        "SELECT row_to_json(q.*) AS {JSON_COLUMN} FROM (\n{body}\n) AS q"
    ))
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[QueryParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            QueryParam::Null => query.bind(None::<String>),
            QueryParam::Bool(b) => query.bind(*b),
            QueryParam::Int(i) => query.bind(*i),
            QueryParam::Float(f) => query.bind(*f),
            QueryParam::Text(s) => query.bind(s.clone()),
        };
    }
    query
}

fn json_row(row: &PgRow) -> Row {
    match row.try_get::<Option<Value>, _>(JSON_COLUMN) {
        Ok(Some(Value::Object(map))) => map,
        Ok(_) => Row::new(),
        Err(e) => {
            tracing::warn!("Undecodable PostgreSQL row: {}", e);
            Row::new()
        }
    }
}

fn text_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .map(|column| {
            let value = row
                .try_get::<Option<String>, _>(column.ordinal())
                .ok()
                .flatten()
                .map(Value::String)
                .unwrap_or(Value::Null);
            (column.name().to_string(), value)
        })
        .collect()
}
