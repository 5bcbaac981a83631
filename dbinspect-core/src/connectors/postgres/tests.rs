//! Unit tests for the PostgreSQL connector that need no server.

use super::PostgresConnector;
use super::connection::sqlstate_hint;
use super::metadata::string_array;
use super::rows::wrap_for_json;
use crate::connectors::{ConnectionConfig, DatabaseConnector};
use crate::error::DbInspectError;
use crate::models::BackendKind;
use crate::security::Credentials;
use serde_json::json;
use std::time::Duration;

fn config() -> ConnectionConfig {
    ConnectionConfig::postgres("localhost".to_string())
        .with_database("shop".to_string())
        .with_credentials(Credentials::new(
            "analyst".to_string(),
            Some("hunter2".to_string()),
        ))
}

#[test]
fn test_new_requires_postgres_config() {
    let err = PostgresConnector::new(ConnectionConfig::sqlite("x.db")).unwrap_err();
    assert!(matches!(err, DbInspectError::Configuration { .. }));

    let err = PostgresConnector::new(ConnectionConfig::new(BackendKind::Postgresql)).unwrap_err();
    assert!(matches!(err, DbInspectError::Configuration { .. }));
}

#[test]
fn test_debug_does_not_leak_password() {
    let connector = PostgresConnector::new(config()).unwrap();
    let debug = format!("{connector:?}");
    assert!(!debug.contains("hunter2"));
    assert!(!connector.is_connected());
}

#[test]
fn test_wrap_for_json() {
    assert_eq!(
        wrap_for_json("SELECT 1 AS one;").as_deref(),
        Some("SELECT row_to_json(q.*) AS row_data FROM (\nSELECT 1 AS one\n) AS q")
    );
    assert!(wrap_for_json("  with x AS (SELECT 1) SELECT * FROM x").is_some());
    assert!(wrap_for_json("VALUES (1, 2)").is_some());
    assert_eq!(wrap_for_json("SHOW search_path"), None);
    assert_eq!(wrap_for_json("EXPLAIN SELECT 1"), None);
}

#[test]
fn test_sqlstate_hints() {
    let cfg = config();

    let auth = sqlstate_hint(Some("28P01"), &cfg).unwrap();
    assert!(auth.contains("analyst"));
    assert!(!auth.contains("hunter2"));

    let missing = sqlstate_hint(Some("3D000"), &cfg).unwrap();
    assert!(missing.contains("'shop' does not exist"));

    assert_eq!(sqlstate_hint(Some("XX000"), &cfg), None);
    assert_eq!(sqlstate_hint(None, &cfg), None);
}

#[test]
fn test_string_array() {
    let value = json!(["tenant_id", null, "id"]);
    assert_eq!(string_array(Some(&value)), ["tenant_id", "id"]);
    assert!(string_array(Some(&json!("x"))).is_empty());
    assert!(string_array(None).is_empty());
}

#[tokio::test]
async fn test_guard_runs_before_connection_check() {
    let connector = PostgresConnector::new(config()).unwrap();

    let err = connector
        .execute("UPDATE orders SET total = 0", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DbInspectError::ReadOnlyViolation { ref keyword } if keyword == "UPDATE"));

    let err = connector.execute("SELECT 1", &[]).await.unwrap_err();
    assert!(err.is_connection_error());
}

#[tokio::test]
async fn test_unreachable_server_is_connection_error() {
    let config = ConnectionConfig::postgres("127.0.0.1".to_string())
        .with_port(1)
        .with_connect_timeout(Duration::from_secs(2));
    let mut connector = PostgresConnector::new(config).unwrap();

    let err = connector.connect().await.unwrap_err();

    assert!(err.is_connection_error());
    assert!(err.to_string().contains("127.0.0.1:1"));
    assert!(!connector.is_connected());
}

#[tokio::test]
async fn test_close_without_connect_is_noop() {
    let mut connector = PostgresConnector::new(config()).unwrap();
    connector.close().await.unwrap();
    connector.close().await.unwrap();
}
