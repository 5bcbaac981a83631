//! Unit tests for the Snowflake connector against a scripted transport.

use super::client::{ApiResponse, StatementTransport, normalize_account};
use super::metadata::clustering_columns;
use super::statement::{QUERY_TAG, request_body, status_error};
use super::{CLUSTERING_KEY_INDEX, PRIMARY_KEY_INDEX, SnowflakeConnector};
use crate::Result;
use crate::connectors::{ConnectionConfig, DatabaseConnector};
use crate::error::DbInspectError;
use crate::models::QueryParam;
use crate::security::Credentials;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Post(Value),
    Get(String, Option<usize>),
}

/// Replays queued responses and records every call.
#[derive(Clone, Default)]
struct MockTransport {
    responses: Arc<Mutex<VecDeque<ApiResponse>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockTransport {
    fn reply(self, status: u16, body: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(ApiResponse::new(status, body.to_string()));
        self
    }

    fn reply_raw(self, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(ApiResponse::new(status, body));
        self
    }

    fn reply_first(self, status: u16, body: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_front(ApiResponse::new(status, body.to_string()));
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self) -> Result<ApiResponse> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DbInspectError::connection("mock transport exhausted"))
    }
}

#[async_trait]
impl StatementTransport for MockTransport {
    async fn post_statement(&self, body: &Value, _request_id: &str) -> Result<ApiResponse> {
        self.calls.lock().unwrap().push(Call::Post(body.clone()));
        self.next()
    }

    async fn get_statement(&self, handle: &str, partition: Option<usize>) -> Result<ApiResponse> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Get(handle.to_string(), partition));
        self.next()
    }
}

fn config() -> ConnectionConfig {
    ConnectionConfig::snowflake("acme-analytics".to_string())
        .with_database("sales".to_string())
        .with_warehouse("compute_wh".to_string())
        .with_credentials(Credentials::new(
            "analyst".to_string(),
            Some("pat-secret".to_string()),
        ))
}

fn result_set(columns: &[(&str, &str)], data: Value) -> Value {
    let row_type: Vec<Value> = columns
        .iter()
        .map(|(name, kind)| json!({ "name": name, "type": kind, "scale": 0 }))
        .collect();
    json!({
        "statementHandle": "h-1",
        "resultSetMetaData": { "rowType": row_type, "partitionInfo": [{ "rowCount": 1 }] },
        "data": data,
    })
}

fn select_one() -> Value {
    result_set(&[("1", "fixed")], json!([["1"]]))
}

/// Connects through `mock`, answering the session check ahead of anything
/// already queued.
async fn connected(mock: MockTransport) -> SnowflakeConnector {
    let mut connector =
        SnowflakeConnector::with_transport(config(), Box::new(mock.reply_first(200, select_one())))
            .unwrap();
    connector.connect().await.unwrap();
    connector
}

#[test]
fn test_new_requires_token() {
    let config = ConnectionConfig::snowflake("acme".to_string());
    let err = SnowflakeConnector::new(config).unwrap_err();
    assert!(matches!(err, DbInspectError::Configuration { .. }));
}

#[test]
fn test_normalize_account_strips_host_suffix() {
    assert_eq!(normalize_account("xy12345.us-east-1"), "xy12345.us-east-1");
    assert_eq!(
        normalize_account("https://Acme-Analytics.snowflakecomputing.com/"),
        "Acme-Analytics"
    );
    assert_eq!(normalize_account(" org-acct "), "org-acct");
}

#[test]
fn test_request_body_carries_session_and_bindings() {
    let body = request_body(
        &config(),
        "SELECT * FROM T WHERE A = ? AND B = ?",
        &[QueryParam::from("x"), QueryParam::Int(3)],
    );

    assert_eq!(body["database"], json!("SALES"));
    assert_eq!(body["schema"], json!("PUBLIC"));
    assert_eq!(body["warehouse"], json!("COMPUTE_WH"));
    assert_eq!(body["parameters"]["query_tag"], json!(QUERY_TAG));
    assert_eq!(body["bindings"]["1"], json!({ "type": "TEXT", "value": "x" }));
    assert_eq!(body["bindings"]["2"], json!({ "type": "FIXED", "value": "3" }));
    assert!(!body.to_string().contains("pat-secret"));
}

#[test]
fn test_status_error_mapping() {
    let auth = status_error(&ApiResponse::new(401, "{\"message\":\"bad token\"}"));
    assert!(auth.is_connection_error());
    assert!(auth.to_string().contains("orgname-accountname"));

    let rejected = status_error(&ApiResponse::new(
        422,
        json!({ "message": "SQL compilation error", "sqlState": "42000" }).to_string(),
    ));
    assert!(matches!(rejected, DbInspectError::QueryExecution { .. }));
    assert!(rejected.to_string().contains("42000"));

    let garbled = status_error(&ApiResponse::new(422, "<html>proxy</html>"));
    assert!(garbled.is_connection_error());

    let unavailable = status_error(&ApiResponse::new(503, ""));
    assert!(unavailable.is_connection_error());
}

#[test]
fn test_clustering_columns() {
    assert_eq!(clustering_columns("LINEAR(REGION, \"order_date\")"), ["REGION", "order_date"]);
    assert_eq!(clustering_columns("TO_DATE(TS)"), ["TO_DATE(TS)"]);
}

#[tokio::test]
async fn test_guard_runs_before_connection_check() {
    let mock = MockTransport::default();
    let connector = SnowflakeConnector::with_transport(config(), Box::new(mock.clone())).unwrap();

    let err = connector.execute("MERGE INTO t USING s ON 1=1", &[]).await.unwrap_err();
    assert!(matches!(err, DbInspectError::ReadOnlyViolation { ref keyword } if keyword == "MERGE"));

    let err = connector.execute("SELECT 1", &[]).await.unwrap_err();
    assert!(err.is_connection_error());
    assert!(mock.calls().is_empty(), "no request may leave before connect");
}

#[tokio::test]
async fn test_connect_failure_is_connection_error() {
    let mock = MockTransport::default().reply(401, json!({ "message": "invalid token" }));
    let mut connector = SnowflakeConnector::with_transport(config(), Box::new(mock)).unwrap();

    let err = connector.connect().await.unwrap_err();

    assert!(err.is_connection_error());
    assert!(!connector.is_connected());
}

#[tokio::test]
async fn test_execute_decodes_and_lowercases() {
    let mock = MockTransport::default().reply(
        200,
        result_set(
            &[("ID", "fixed"), ("NAME", "text"), ("ACTIVE", "boolean")],
            json!([["7", "Widget", "true"], ["8", null, "false"]]),
        ),
    );
    let connector = connected(mock).await;

    let rows = connector.execute("SELECT ID, NAME, ACTIVE FROM T", &[]).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], json!(7));
    assert_eq!(rows[0]["name"], json!("Widget"));
    assert_eq!(rows[0]["active"], json!(true));
    assert_eq!(rows[1]["name"], json!(null));
}

#[tokio::test]
async fn test_async_statement_is_polled() {
    let mock = MockTransport::default()
        .reply(202, json!({ "statementHandle": "h-9", "message": "running" }))
        .reply(202, json!({ "statementHandle": "h-9" }))
        .reply(200, result_set(&[("C", "fixed")], json!([["42"]])));
    let connector = connected(mock.clone()).await;

    let rows = connector.execute("SELECT COUNT(*) AS c FROM T", &[]).await.unwrap();

    assert_eq!(rows[0]["c"], json!(42));
    let gets: Vec<Call> = mock
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Get(..)))
        .collect();
    assert_eq!(
        gets,
        [Call::Get("h-9".to_string(), None), Call::Get("h-9".to_string(), None)]
    );
}

#[tokio::test]
async fn test_all_partitions_are_fetched() {
    let first = json!({
        "statementHandle": "h-2",
        "resultSetMetaData": {
            "rowType": [{ "name": "N", "type": "fixed", "scale": 0 }],
            "partitionInfo": [{ "rowCount": 1 }, { "rowCount": 1 }, { "rowCount": 1 }],
        },
        "data": [["1"]],
    });
    let mock = MockTransport::default()
        .reply(200, first)
        .reply(200, json!({ "data": [["2"]] }))
        .reply(200, json!({ "data": [["3"]] }));
    let connector = connected(mock.clone()).await;

    let rows = connector.execute("SELECT N FROM T", &[]).await.unwrap();

    let values: Vec<Value> = rows.iter().map(|r| r["n"].clone()).collect();
    assert_eq!(values, [json!(1), json!(2), json!(3)]);
    assert!(mock.calls().contains(&Call::Get("h-2".to_string(), Some(2))));
}

#[tokio::test]
async fn test_undecodable_success_body_is_connection_error() {
    let mock = MockTransport::default().reply_raw(200, "not json");
    let connector = connected(mock).await;

    let err = connector.execute("SELECT 1", &[]).await.unwrap_err();
    assert!(err.is_connection_error());
}

#[tokio::test]
async fn test_qualified_table_is_unquoted_upper_case() {
    let connector = SnowflakeConnector::new(config().with_schema("analytics".to_string())).unwrap();
    assert_eq!(connector.qualified_table("orders", None), "ANALYTICS.ORDERS");
    assert_eq!(connector.qualified_table("orders", Some("raw")), "RAW.ORDERS");

    let default_schema = SnowflakeConnector::new(config()).unwrap();
    assert_eq!(default_schema.qualified_table("t", None), "PUBLIC.T");
}

#[tokio::test]
async fn test_list_columns_binds_upper_case_names() {
    let mock = MockTransport::default().reply(
        200,
        result_set(
            &[
                ("COLUMN_NAME", "text"),
                ("DATA_TYPE", "text"),
                ("IS_NULLABLE", "text"),
                ("ORDINAL_POSITION", "fixed"),
                ("IS_PRIMARY_KEY", "boolean"),
            ],
            json!([
                ["ID", "NUMBER", "NO", "1", "true"],
                ["EMAIL", "TEXT", "YES", "2", "false"],
            ]),
        ),
    );
    let connector = connected(mock.clone()).await;

    let columns = connector.list_columns("customers", Some("crm")).await.unwrap();

    assert_eq!(columns.len(), 2);
    assert!(columns[0].is_primary_key);
    assert!(!columns[0].is_nullable);
    assert_eq!(columns[1].ordinal_position, 2);

    let Some(Call::Post(body)) = mock.calls().last().cloned() else {
        panic!("expected a statement");
    };
    assert_eq!(body["bindings"]["1"]["value"], json!("CRM"));
    assert_eq!(body["bindings"]["2"]["value"], json!("CUSTOMERS"));
    assert_eq!(body["bindings"]["4"]["value"], json!("CUSTOMERS"));
}

#[tokio::test]
async fn test_list_indexes_are_synthetic() {
    let mock = MockTransport::default()
        .reply(
            200,
            result_set(&[("COLUMN_NAME", "text")], json!([["TENANT_ID"], ["ID"]])),
        )
        .reply(
            200,
            result_set(&[("CLUSTERING_KEY", "text")], json!([["LINEAR(REGION)"]])),
        );
    let connector = connected(mock).await;

    let indexes = connector.list_indexes("orders", None).await.unwrap();

    assert_eq!(indexes.len(), 2);
    assert_eq!(indexes[0].name, PRIMARY_KEY_INDEX);
    assert!(indexes[0].is_unique);
    assert_eq!(indexes[0].columns, ["TENANT_ID", "ID"]);
    assert_eq!(indexes[1].name, CLUSTERING_KEY_INDEX);
    assert_eq!(indexes[1].columns, ["REGION"]);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let mut connector = connected(MockTransport::default()).await;
    connector.close().await.unwrap();
    connector.close().await.unwrap();
    assert!(!connector.is_connected());
}
