//! SQLite connector.
//!
//! # Module Structure
//! - `connection`: read-only pool creation and lifecycle
//! - `rows`: statement execution and dynamic row decoding
//! - `metadata`: `sqlite_master` and PRAGMA based catalog listings
//!
//! # SQLite-Specific Behavior
//! - The database file is opened read-only and never created
//! - A single pooled connection is used; there is one schema, `main`
//! - Views are listed alongside tables
//!
//! # Security Guarantees
//! - Every statement passes the read-only guard before touching the pool
//! - No network access required

pub mod connection;
pub mod metadata;
pub mod rows;

#[cfg(test)]
mod tests;

use super::{ConnectionConfig, DatabaseConnector};
use crate::Result;
use crate::error::DbInspectError;
use crate::models::{
    BackendKind, ColumnMetadata, ForeignKeyRef, IndexInfo, QueryParam, Row, TableMetadata,
};
use crate::stats::{HeuristicClassifier, TypeClassifier};
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Read-only connector for a SQLite database file.
pub struct SqliteConnector {
    config: ConnectionConfig,
    pool: Option<SqlitePool>,
    classifier: HeuristicClassifier,
}

impl std::fmt::Debug for SqliteConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnector")
            .field("config", &self.config.to_string())
            .field("connected", &self.pool.is_some())
            .finish_non_exhaustive()
    }
}

impl SqliteConnector {
    /// Creates an unconnected connector.
    ///
    /// # Errors
    /// Returns `Configuration` if the config is invalid or is not for SQLite.
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        if config.backend != BackendKind::Sqlite {
            return Err(DbInspectError::configuration(format!(
                "SQLite connector cannot use a {} configuration",
                config.backend
            )));
        }
        config.validate()?;

        let classifier = HeuristicClassifier::with_overrides(&config.type_overrides);
        Ok(Self {
            config,
            pool: None,
            classifier,
        })
    }

    /// Wraps an already open pool, bypassing file checks. Used for in-memory
    /// databases.
    pub fn with_pool(config: ConnectionConfig, pool: SqlitePool) -> Result<Self> {
        let mut connector = Self::new(config)?;
        connector.pool = Some(pool);
        Ok(connector)
    }

    pub(crate) fn pool(&self) -> Result<&SqlitePool> {
        self.pool
            .as_ref()
            .ok_or_else(|| DbInspectError::connection("SQLite connector is not connected"))
    }
}

#[async_trait]
impl DatabaseConnector for SqliteConnector {
    fn backend(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        if self.pool.is_some() {
            return Ok(());
        }
        let pool = connection::open_read_only_pool(&self.config).await?;
        self.pool = Some(pool);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            tracing::info!("Closed SQLite connection to {}", self.config);
        }
        Ok(())
    }

    async fn execute(&self, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>> {
        rows::execute(self, sql, params).await
    }

    async fn list_schemas(&self) -> Result<Vec<String>> {
        Ok(vec![BackendKind::Sqlite.default_schema().to_string()])
    }

    async fn list_tables(&self, _schema: Option<&str>) -> Result<Vec<TableMetadata>> {
        metadata::list_tables(self).await
    }

    async fn list_columns(
        &self,
        table: &str,
        _schema: Option<&str>,
    ) -> Result<Vec<ColumnMetadata>> {
        metadata::list_columns(self, table).await
    }

    async fn list_foreign_keys(
        &self,
        table: &str,
        _schema: Option<&str>,
    ) -> Result<Vec<ForeignKeyRef>> {
        metadata::list_foreign_keys(self, table).await
    }

    async fn list_indexes(&self, table: &str, _schema: Option<&str>) -> Result<Vec<IndexInfo>> {
        metadata::list_indexes(self, table).await
    }

    /// SQLite has no schemas beyond `main`, so tables are never qualified.
    fn qualified_table(&self, table: &str, _schema: Option<&str>) -> String {
        self.quote_identifier(table)
    }

    fn type_classifier(&self) -> &dyn TypeClassifier {
        &self.classifier
    }
}
