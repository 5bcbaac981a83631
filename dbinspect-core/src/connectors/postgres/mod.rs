//! PostgreSQL connector.
//!
//! # Module Structure
//! - `connection`: pool creation, session settings and connect-error mapping
//! - `rows`: guarded execution with `row_to_json` decoding
//! - `metadata`: `information_schema` / `pg_index` catalog listings
//!
//! # Security Guarantees
//! - Every pooled connection runs with `default_transaction_read_only = on`
//! - Statements pass the read-only guard before reaching the pool
//! - Connection details are logged without credentials

mod connection;
mod metadata;
mod rows;

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
use sqlx::PgPool;

pub use connection::DEFAULT_PORT;

/// Read-only connector for a PostgreSQL server.
pub struct PostgresConnector {
    config: ConnectionConfig,
    pool: Option<PgPool>,
    classifier: HeuristicClassifier,
}

impl std::fmt::Debug for PostgresConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConnector")
            .field("config", &self.config.to_string())
            .field("pool_size", &self.pool.as_ref().map(PgPool::size))
            .finish_non_exhaustive()
    }
}

impl PostgresConnector {
    /// Creates an unconnected connector.
    ///
    /// # Errors
    /// Returns `Configuration` if the config is invalid or is not for
    /// PostgreSQL.
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        if config.backend != BackendKind::Postgresql {
            return Err(DbInspectError::configuration(format!(
                "PostgreSQL connector cannot use a {} configuration",
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

    pub(crate) fn pool(&self) -> Result<&PgPool> {
        self.pool
            .as_ref()
            .ok_or_else(|| DbInspectError::connection("PostgreSQL connector is not connected"))
    }

    fn schema_or_default(&self, schema: Option<&str>) -> String {
        schema
            .map(str::to_string)
            .unwrap_or_else(|| self.config.effective_schema())
    }
}

#[async_trait]
impl DatabaseConnector for PostgresConnector {
    fn backend(&self) -> BackendKind {
        BackendKind::Postgresql
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
        let pool = connection::create_pool(&self.config).await?;
        self.pool = Some(pool);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            tracing::info!("Closed PostgreSQL pool for {}", self.config);
        }
        Ok(())
    }

    async fn execute(&self, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>> {
        rows::execute(self, sql, params).await
    }

    async fn list_schemas(&self) -> Result<Vec<String>> {
        metadata::list_schemas(self).await
    }

    async fn list_tables(&self, schema: Option<&str>) -> Result<Vec<TableMetadata>> {
        metadata::list_tables(self, &self.schema_or_default(schema)).await
    }

    async fn list_columns(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ColumnMetadata>> {
        metadata::list_columns(self, table, &self.schema_or_default(schema)).await
    }

    async fn list_foreign_keys(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ForeignKeyRef>> {
        metadata::list_foreign_keys(self, table, &self.schema_or_default(schema)).await
    }

    async fn list_indexes(&self, table: &str, schema: Option<&str>) -> Result<Vec<IndexInfo>> {
        metadata::list_indexes(self, table, &self.schema_or_default(schema)).await
    }

    fn type_classifier(&self) -> &dyn TypeClassifier {
        &self.classifier
    }
}
