//! Statement submission, polling, partition fetch and error mapping.

use super::client::{ACCOUNT_FORMAT_HINT, ApiResponse, StatementTransport};
use super::decode::{ResultSet, StatementStatus, decode_rows};
use crate::Result;
use crate::connectors::ConnectionConfig;
use crate::error::DbInspectError;
use crate::models::{QueryParam, Row};
use serde_json::{Map, Value, json};
use std::time::{Duration, Instant};

/// Tag attached to every statement for auditing in query history.
pub const QUERY_TAG: &str = "dbinspect-readonly";

/// Delay between polls of a statement still running.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Builds the request body for one statement.
pub fn request_body(config: &ConnectionConfig, sql: &str, params: &[QueryParam]) -> Value {
    let mut body = Map::new();
    body.insert("statement".to_string(), json!(sql));
    body.insert("timeout".to_string(), json!(config.query_timeout.as_secs().max(1)));
    if let Some(database) = &config.database {
        body.insert("database".to_string(), json!(database.to_uppercase()));
    }
    body.insert("schema".to_string(), json!(config.effective_schema().to_uppercase()));
    if let Some(warehouse) = &config.warehouse {
        body.insert("warehouse".to_string(), json!(warehouse.to_uppercase()));
    }
    if !params.is_empty() {
        let bindings: Map<String, Value> = params
            .iter()
            .enumerate()
            .map(|(index, param)| ((index + 1).to_string(), binding(param)))
            .collect();
        body.insert("bindings".to_string(), Value::Object(bindings));
    }
    body.insert(
        "parameters".to_string(),
        json!({ "query_tag": QUERY_TAG, "timezone": "UTC" }),
    );
    Value::Object(body)
}

fn binding(param: &QueryParam) -> Value {
    match param {
        QueryParam::Null => json!({ "type": "TEXT", "value": null }),
        QueryParam::Bool(b) => json!({ "type": "BOOLEAN", "value": b.to_string() }),
        QueryParam::Int(i) => json!({ "type": "FIXED", "value": i.to_string() }),
        QueryParam::Float(f) => json!({ "type": "REAL", "value": f.to_string() }),
        QueryParam::Text(s) => json!({ "type": "TEXT", "value": s }),
    }
}

/// Runs a statement to completion and returns every row of every partition.
pub async fn run(
    transport: &dyn StatementTransport,
    config: &ConnectionConfig,
    sql: &str,
    params: &[QueryParam],
) -> Result<Vec<Row>> {
    let body = request_body(config, sql, params);
    let request_id = uuid::Uuid::new_v4().to_string();
    let deadline = Instant::now() + config.query_timeout + config.connect_timeout;

    let mut response = transport.post_statement(&body, &request_id).await?;
    loop {
        match response.status {
            200 => break,
            202 => {
                let handle = parse_status(&response)?.statement_handle.ok_or_else(|| {
                    malformed(&response, "accepted statement has no handle")
                })?;
                if Instant::now() >= deadline {
                    return Err(DbInspectError::query_failed(format!(
                        "Snowflake statement {handle} did not finish within {}s",
                        config.query_timeout.as_secs()
                    )));
                }
                tracing::debug!("Snowflake statement {} still running", handle);
                tokio::time::sleep(POLL_INTERVAL).await;
                response = transport.get_statement(&handle, None).await?;
            }
            _ => return Err(status_error(&response)),
        }
    }

    let first: ResultSet = serde_json::from_str(&response.body)
        .map_err(|_| malformed(&response, "result set could not be decoded"))?;
    let Some(meta) = first.result_set_meta_data else {
        return Ok(Vec::new());
    };

    let mut rows = decode_rows(&meta.row_type, &first.data);

    if meta.partition_info.len() > 1 {
        let handle = first
            .statement_handle
            .ok_or_else(|| malformed(&response, "partitioned result has no handle"))?;
        for partition in 1..meta.partition_info.len() {
            let reply = transport.get_statement(&handle, Some(partition)).await?;
            if reply.status != 200 {
                return Err(status_error(&reply));
            }
            let page: ResultSet = serde_json::from_str(&reply.body)
                .map_err(|_| malformed(&reply, "result partition could not be decoded"))?;
            rows.extend(decode_rows(&meta.row_type, &page.data));
        }
    }

    Ok(rows)
}

fn parse_status(response: &ApiResponse) -> Result<StatementStatus> {
    serde_json::from_str(&response.body)
        .map_err(|_| malformed(response, "status body could not be decoded"))
}

fn malformed(response: &ApiResponse, what: &str) -> DbInspectError {
    DbInspectError::connection(format!(
        "Snowflake returned an unreadable response (HTTP {}): {what}. {ACCOUNT_FORMAT_HINT}",
        response.status
    ))
}

/// Maps a non-success reply to an error.
///
/// Authentication, routing, throttling and server failures are
/// `Connection`; a statement the server rejected is `QueryExecution`.
pub fn status_error(response: &ApiResponse) -> DbInspectError {
    let status = serde_json::from_str::<StatementStatus>(&response.body).ok();
    let message = status
        .as_ref()
        .and_then(|s| s.message.clone())
        .unwrap_or_default();

    match response.status {
        400 | 422 if status.is_some() => {
            let code = status
                .as_ref()
                .and_then(|s| s.sql_state.clone().or_else(|| s.code.clone()))
                .map(|c| format!(" [{c}]"))
                .unwrap_or_default();
            DbInspectError::query_failed(format!("Snowflake rejected the statement{code}: {message}"))
        }
        401 | 403 => DbInspectError::connection(format!(
            "Snowflake authentication failed (HTTP {}). Check that the programmatic access token is valid and not expired. {ACCOUNT_FORMAT_HINT}",
            response.status
        )),
        404 => DbInspectError::connection(format!(
            "Snowflake endpoint not found (HTTP 404). {ACCOUNT_FORMAT_HINT}"
        )),
        429 => DbInspectError::connection(
            "Snowflake is throttling requests (HTTP 429); retry later",
        ),
        code if code >= 500 => DbInspectError::connection(format!(
            "Snowflake service error (HTTP {code}). {ACCOUNT_FORMAT_HINT}"
        )),
        _ if status.is_none() => malformed(response, "error body could not be decoded"),
        code => DbInspectError::query_failed(format!("Snowflake request failed (HTTP {code}): {message}")),
    }
}
