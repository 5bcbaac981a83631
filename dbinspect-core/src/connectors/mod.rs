//! Connector trait and factory for read-only database access.
//!
//! Every backend implements [`DatabaseConnector`]: lifecycle, guarded query
//! execution, normalized catalog listings and the identifier quoting policy
//! the statistics engine relies on.
//!
//! # Module Structure
//! - `config`: `ConnectionConfig`
//! - `helpers`: row value extraction shared by connectors and engines
//! - Backend modules (`sqlite`, `postgres`, `snowflake`), each behind its
//!   cargo feature

use crate::Result;
use crate::error::DbInspectError;
use crate::models::{
    BackendKind, ColumnMetadata, ForeignKeyRef, IndexInfo, QueryParam, Row, TableMetadata,
};
use crate::stats::{ColumnStats, TypeClassifier};
use async_trait::async_trait;

pub mod config;
pub mod helpers;

pub use config::ConnectionConfig;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgresql")]
pub mod postgres;

#[cfg(feature = "snowflake")]
pub mod snowflake;

#[cfg(test)]
pub(crate) mod scripted;

/// Read-only connection to one backend.
///
/// # Security Guarantees
/// - `execute` applies the read-only guard before anything else, including
///   the connection check, and has no bypass
/// - Sessions are additionally opened read-only where the backend allows it
/// - Credentials are never stored in returned records or logged
///
/// # Concurrency
/// One connector holds one backend session. `connect` and `close` take
/// `&mut self`; queries take `&self` and are serialized by the backend
/// session. Open one connector per concurrent analysis.
///
/// # Object Safety
/// This trait is object-safe and is normally used as
/// `Box<dyn DatabaseConnector>`.
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    /// Backend this connector talks to.
    fn backend(&self) -> BackendKind;

    /// Configuration the connector was built from (credentials never exposed
    /// through serialization or display).
    fn config(&self) -> &ConnectionConfig;

    /// True between a successful `connect` and `close`.
    fn is_connected(&self) -> bool;

    /// Establishes the backend session.
    ///
    /// # Errors
    /// Returns `Connection` with an actionable message on authentication,
    /// network or file-access failures.
    async fn connect(&mut self) -> Result<()>;

    /// Releases the backend session. Calling it again is a no-op.
    async fn close(&mut self) -> Result<()>;

    /// Runs one read-only statement and returns its rows in result order.
    ///
    /// # Errors
    /// - `ReadOnlyViolation` if any statement does not start with an
    ///   allowed keyword, before any connection check or network call
    /// - `Connection` if the connector is not connected
    /// - `QueryExecution` if the backend rejects the statement
    async fn execute(&self, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>>;

    /// Schema names visible to the session.
    async fn list_schemas(&self) -> Result<Vec<String>>;

    /// Tables and views in `schema` (or the configured default).
    async fn list_tables(&self, schema: Option<&str>) -> Result<Vec<TableMetadata>>;

    /// Columns of `table` in ordinal order.
    async fn list_columns(&self, table: &str, schema: Option<&str>)
    -> Result<Vec<ColumnMetadata>>;

    /// Foreign keys declared on `table`. Empty when the backend cannot
    /// report them.
    async fn list_foreign_keys(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ForeignKeyRef>>;

    /// Indexes on `table`. Empty when the backend has none.
    async fn list_indexes(&self, table: &str, schema: Option<&str>) -> Result<Vec<IndexInfo>>;

    /// First `limit` rows of `table`.
    async fn sample_rows(&self, table: &str, schema: Option<&str>, limit: u32) -> Result<Vec<Row>> {
        let sql = format!(
            "SELECT * FROM {} LIMIT {}",
            self.qualified_table(table, schema),
            limit
        );
        self.execute(&sql, &[]).await
    }

    /// Quotes one identifier for use in generated SQL.
    fn quote_identifier(&self, name: &str) -> String {
        quote_ansi(name)
    }

    /// Schema-qualified table reference for generated SQL.
    fn qualified_table(&self, table: &str, schema: Option<&str>) -> String {
        match schema {
            Some(schema) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(table)
            ),
            None => self.quote_identifier(table),
        }
    }

    /// Classifier deciding which optional statistics apply to a column.
    fn type_classifier(&self) -> &dyn TypeClassifier;

    /// Computes statistics for one column. Never fails; see
    /// [`crate::stats::compute_column_stats`].
    async fn column_stats(
        &self,
        table: &str,
        column: &str,
        data_type: &str,
        schema: Option<&str>,
    ) -> ColumnStats {
        crate::stats::compute_column_stats(self, table, column, data_type, schema).await
    }
}

/// ANSI double-quoting with embedded quotes doubled.
///
/// # Example
/// ```rust
/// use dbinspect_core::connectors::quote_ansi;
///
/// assert_eq!(quote_ansi("order"), "\"order\"");
/// assert_eq!(quote_ansi("say \"hi\""), "\"say \"\"hi\"\"\"");
/// ```
pub fn quote_ansi(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Backend names with an implementation compiled into this build.
pub fn supported_backends() -> Vec<&'static str> {
    let mut supported = Vec::new();
    if cfg!(feature = "sqlite") {
        supported.push(BackendKind::Sqlite.as_str());
    }
    if cfg!(feature = "postgresql") {
        supported.push(BackendKind::Postgresql.as_str());
    }
    if cfg!(feature = "snowflake") {
        supported.push(BackendKind::Snowflake.as_str());
    }
    supported
}

/// Factory function creating an unconnected connector for `config`.
///
/// # Errors
/// - `UnsupportedBackend` naming the requested kind and the supported set
///   when the backend has no implementation or its feature is not compiled in
/// - `Configuration` when the configuration does not validate
pub fn create_connector(config: ConnectionConfig) -> Result<Box<dyn DatabaseConnector>> {
    let unsupported =
        |kind: BackendKind| DbInspectError::unsupported_backend(kind.as_str(), &supported_backends());

    match config.backend {
        #[cfg(feature = "sqlite")]
        BackendKind::Sqlite => Ok(Box::new(sqlite::SqliteConnector::new(config)?)),
        #[cfg(feature = "postgresql")]
        BackendKind::Postgresql => Ok(Box::new(postgres::PostgresConnector::new(config)?)),
        #[cfg(feature = "snowflake")]
        BackendKind::Snowflake => Ok(Box::new(snowflake::SnowflakeConnector::new(config)?)),
        other => Err(unsupported(other)),
    }
}

/// Safely redacts credentials from database connection URLs.
///
/// Delegates to [`crate::error::redact_database_url`].
#[inline]
pub fn redact_database_url(url: &str) -> String {
    crate::error::redact_database_url(url)
}
