//! Unit tests for the SQLite connector.

use super::SqliteConnector;
use super::metadata::parse_type_modifiers;
use crate::connectors::{ConnectionConfig, DatabaseConnector};
use crate::error::DbInspectError;
use crate::models::{BackendKind, QueryParam, TableKind};
use serde_json::json;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool")
}

async fn seeded_connector() -> SqliteConnector {
    let pool = memory_pool().await;
    for statement in [
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, email VARCHAR(120) NOT NULL, \
         balance DECIMAL(10,2) DEFAULT 0, note TEXT)",
        "CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER NOT NULL \
         REFERENCES customers(id) ON DELETE CASCADE, total REAL, created_at DATETIME)",
        "CREATE UNIQUE INDEX idx_customers_email ON customers(email)",
        "CREATE INDEX idx_orders_customer_created ON orders(customer_id, created_at)",
        "CREATE VIEW big_orders AS SELECT * FROM orders WHERE total > 100",
        "INSERT INTO customers (email, balance, note) VALUES \
         ('a@example.com', 10.5, NULL), ('b@example.com', 0, 'vip'), ('c@example.com', 3, x'DEAD')",
        "INSERT INTO orders (customer_id, total, created_at) VALUES \
         (1, 150.0, '2024-05-01 10:00:00'), (2, 20.0, '2024-05-02 11:30:00')",
    ] {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    SqliteConnector::with_pool(ConnectionConfig::sqlite(":memory:"), pool).unwrap()
}

#[test]
fn test_new_rejects_foreign_backend_config() {
    let config = ConnectionConfig::postgres("localhost".to_string());
    let err = SqliteConnector::new(config).unwrap_err();
    assert!(matches!(err, DbInspectError::Configuration { .. }));
}

#[test]
fn test_new_is_unconnected() {
    let connector = SqliteConnector::new(ConnectionConfig::sqlite("data.db")).unwrap();
    assert_eq!(connector.backend(), BackendKind::Sqlite);
    assert!(!connector.is_connected());
}

#[test]
fn test_debug_output_is_safe() {
    let connector = SqliteConnector::new(ConnectionConfig::sqlite("data.db")).unwrap();
    let debug = format!("{connector:?}");
    assert!(debug.contains("SqliteConnector"));
    assert!(debug.contains("connected: false"));
}

#[test]
fn test_parse_type_modifiers() {
    assert_eq!(parse_type_modifiers("VARCHAR(255)"), (Some(255), None, None));
    assert_eq!(parse_type_modifiers("decimal(10, 2)"), (None, Some(10), Some(2)));
    assert_eq!(parse_type_modifiers("NUMERIC(8)"), (None, Some(8), Some(0)));
    assert_eq!(parse_type_modifiers("INTEGER"), (None, None, None));
    assert_eq!(parse_type_modifiers("CHAR(x)"), (None, None, None));
}

#[tokio::test]
async fn test_missing_file_fails_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.db");
    let mut connector = SqliteConnector::new(ConnectionConfig::sqlite(&path)).unwrap();

    let err = connector.connect().await.unwrap_err();

    assert!(err.is_connection_error());
    assert!(err.to_string().contains("absent.db"));
    assert!(!path.exists(), "connect must never create the file");
}

#[tokio::test]
async fn test_guard_runs_before_connection_check() {
    let connector = SqliteConnector::new(ConnectionConfig::sqlite("data.db")).unwrap();

    let err = connector.execute("DELETE FROM t", &[]).await.unwrap_err();
    assert!(matches!(err, DbInspectError::ReadOnlyViolation { ref keyword } if keyword == "DELETE"));

    let err = connector.execute("SELECT 1", &[]).await.unwrap_err();
    assert!(err.is_connection_error());
}

#[tokio::test]
async fn test_execute_decodes_values_in_column_order() {
    let connector = seeded_connector().await;

    let rows = connector
        .execute(
            "SELECT id, email, balance, note FROM customers ORDER BY id",
            &[],
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 3);
    let keys: Vec<&String> = rows[0].keys().collect();
    assert_eq!(keys, ["id", "email", "balance", "note"]);
    assert_eq!(rows[0]["id"], json!(1));
    assert_eq!(rows[0]["balance"], json!(10.5));
    assert_eq!(rows[0]["note"], json!(null));
    assert_eq!(rows[1]["note"], json!("vip"));
    assert_eq!(rows[2]["note"], json!("base64:3q0="));
}

#[tokio::test]
async fn test_execute_binds_parameters() {
    let connector = seeded_connector().await;

    let rows = connector
        .execute(
            "SELECT email FROM customers WHERE id = ?1 OR email = ?2",
            &[QueryParam::Int(2), QueryParam::from("c@example.com")],
        )
        .await
        .unwrap();

    let emails: Vec<_> = rows.iter().map(|r| r["email"].clone()).collect();
    assert_eq!(emails, [json!("b@example.com"), json!("c@example.com")]);
}

#[tokio::test]
async fn test_execute_rejects_mutation_hidden_after_select() {
    let connector = seeded_connector().await;

    let err = connector
        .execute("SELECT 1; DROP TABLE customers", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DbInspectError::ReadOnlyViolation { ref keyword } if keyword == "DROP"));

    let still_there = connector
        .execute("SELECT COUNT(*) AS c FROM customers", &[])
        .await
        .unwrap();
    assert_eq!(still_there[0]["c"], json!(3));
}

#[tokio::test]
async fn test_bad_sql_is_query_error() {
    let connector = seeded_connector().await;
    let err = connector
        .execute("SELECT * FROM no_such_table", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DbInspectError::QueryExecution { .. }));
    assert!(err.to_string().contains("no such table"));
}

#[tokio::test]
async fn test_list_tables_includes_views_and_counts() {
    let connector = seeded_connector().await;

    let tables = connector.list_tables(None).await.unwrap();
    let summary: Vec<_> = tables
        .iter()
        .map(|t| (t.name.as_str(), t.kind, t.row_count))
        .collect();

    assert_eq!(
        summary,
        [
            ("big_orders", TableKind::View, 1),
            ("customers", TableKind::Table, 3),
            ("orders", TableKind::Table, 2),
        ]
    );
    assert_eq!(connector.list_schemas().await.unwrap(), ["main"]);
}

#[tokio::test]
async fn test_list_columns() {
    let connector = seeded_connector().await;

    let columns = connector.list_columns("customers", None).await.unwrap();

    assert_eq!(columns.len(), 4);
    assert_eq!(columns[0].name, "id");
    assert!(columns[0].is_primary_key);
    assert_eq!(columns[0].ordinal_position, 1);
    assert_eq!(columns[1].data_type, "VARCHAR(120)");
    assert!(!columns[1].is_nullable);
    assert_eq!(columns[1].character_maximum_length, Some(120));
    assert_eq!(columns[2].default_value.as_deref(), Some("0"));
    assert_eq!(columns[2].numeric_precision, Some(10));
    assert_eq!(columns[2].numeric_scale, Some(2));
    assert!(columns[3].is_nullable);
    assert_eq!(columns[3].ordinal_position, 4);
}

#[tokio::test]
async fn test_list_foreign_keys() {
    let connector = seeded_connector().await;

    let fks = connector.list_foreign_keys("orders", None).await.unwrap();

    assert_eq!(fks.len(), 1);
    assert_eq!(fks[0].column, "customer_id");
    assert_eq!(fks[0].referenced_table, "customers");
    assert_eq!(fks[0].referenced_column, "id");
    assert_eq!(fks[0].on_delete, "CASCADE");
    assert!(connector.list_foreign_keys("customers", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_indexes_keeps_column_order() {
    let connector = seeded_connector().await;

    let indexes = connector.list_indexes("orders", None).await.unwrap();
    let composite = indexes
        .iter()
        .find(|i| i.name == "idx_orders_customer_created")
        .unwrap();
    assert!(!composite.is_unique);
    assert_eq!(composite.columns, ["customer_id", "created_at"]);

    let unique = connector.list_indexes("customers", None).await.unwrap();
    assert!(unique.iter().any(|i| i.name == "idx_customers_email" && i.is_unique));
}

#[tokio::test]
async fn test_sample_rows_limits_results() {
    let connector = seeded_connector().await;
    let rows = connector.sample_rows("customers", None, 2).await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_column_stats_on_real_data() {
    let connector = seeded_connector().await;

    let stats = connector
        .column_stats("customers", "balance", "DECIMAL(10,2)", None)
        .await;

    assert_eq!(stats.error, None);
    assert_eq!(stats.total_rows, Some(3));
    assert_eq!(stats.min, Some(0.0));
    assert_eq!(stats.max, Some(10.5));
    assert_eq!(stats.sum, Some(13.5));
    assert_eq!(stats.avg, Some(4.5));
    assert!(stats.std_dev.is_some());
    assert_eq!(stats.top_values.map(|v| v.len()), Some(3));
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let mut connector = seeded_connector().await;
    assert!(connector.is_connected());

    connector.close().await.unwrap();
    connector.close().await.unwrap();

    assert!(!connector.is_connected());
    assert!(connector.execute("SELECT 1", &[]).await.unwrap_err().is_connection_error());
}

#[tokio::test]
async fn test_file_session_is_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.db");
    {
        let options = sqlx::sqlite::SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await.unwrap();
        sqlx::query("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO items (name) VALUES ('bolt')")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;
    }

    let mut connector = SqliteConnector::new(ConnectionConfig::sqlite(&path)).unwrap();
    connector.connect().await.unwrap();

    let rows = connector.execute("SELECT name FROM items", &[]).await.unwrap();
    assert_eq!(rows[0]["name"], json!("bolt"));

    // Bypass the statement guard to prove the session itself refuses writes
    let write = sqlx::query("INSERT INTO items (name) VALUES ('nut')")
        .execute(connector.pool().unwrap())
        .await;
    assert!(write.is_err());

    connector.close().await.unwrap();
}
