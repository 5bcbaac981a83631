//! Snowflake connector over the SQL API.
//!
//! # Module Structure
//! - `client`: `StatementTransport` and its reqwest implementation
//! - `statement`: request bodies, polling, partitions and error mapping
//! - `decode`: typed decoding of string cells
//! - `metadata`: `INFORMATION_SCHEMA` listings and synthetic indexes
//!
//! # Snowflake-Specific Behavior
//! - Stateless HTTPS: every statement is one API call carrying database,
//!   schema, warehouse and a `QUERY_TAG`
//! - Authentication uses a programmatic access token held in the
//!   credentials' password slot
//! - Table references are unquoted and upper-cased so unquoted catalog
//!   names resolve
//! - Result keys are lower-cased

pub mod client;
pub mod decode;
mod metadata;
pub mod statement;

#[cfg(test)]
mod tests;

use super::{ConnectionConfig, DatabaseConnector};
use crate::Result;
use crate::error::DbInspectError;
use crate::models::{
    BackendKind, ColumnMetadata, ForeignKeyRef, IndexInfo, QueryParam, Row, TableMetadata,
};
use crate::security::assert_read_only;
use crate::stats::{HeuristicClassifier, TypeClassifier};
use async_trait::async_trait;

pub use client::{ApiResponse, SqlApiClient, StatementTransport, normalize_account};
pub use metadata::{CLUSTERING_KEY_INDEX, PRIMARY_KEY_INDEX};

/// Read-only connector for a Snowflake account.
pub struct SnowflakeConnector {
    config: ConnectionConfig,
    transport: Option<Box<dyn StatementTransport>>,
    connected: bool,
    classifier: HeuristicClassifier,
}

impl std::fmt::Debug for SnowflakeConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeConnector")
            .field("config", &self.config.to_string())
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl SnowflakeConnector {
    /// Creates an unconnected connector.
    ///
    /// # Errors
    /// Returns `Configuration` if the config is invalid or is not for
    /// Snowflake.
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        if config.backend != BackendKind::Snowflake {
            return Err(DbInspectError::configuration(format!(
                "Snowflake connector cannot use a {} configuration",
                config.backend
            )));
        }
        config.validate()?;

        let classifier = HeuristicClassifier::with_overrides(&config.type_overrides);
        Ok(Self {
            config,
            transport: None,
            connected: false,
            classifier,
        })
    }

    /// Creates an unconnected connector that sends statements through
    /// `transport` instead of building an HTTP client.
    pub fn with_transport(config: ConnectionConfig, transport: Box<dyn StatementTransport>) -> Result<Self> {
        let mut connector = Self::new(config)?;
        connector.transport = Some(transport);
        Ok(connector)
    }

    fn build_client(&self) -> Result<SqlApiClient> {
        let credentials = self
            .config
            .credentials()
            .cloned()
            .ok_or_else(|| DbInspectError::configuration("Snowflake requires a programmatic access token"))?;
        let account = self.config.account.as_deref().unwrap_or_default();
        SqlApiClient::new(
            account,
            credentials,
            self.config.connect_timeout,
            self.config.query_timeout + self.config.connect_timeout,
        )
    }

    fn default_schema(&self, schema: Option<&str>) -> String {
        schema
            .map(str::to_string)
            .unwrap_or_else(|| self.config.effective_schema())
    }
}

#[async_trait]
impl DatabaseConnector for SnowflakeConnector {
    fn backend(&self) -> BackendKind {
        BackendKind::Snowflake
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    /// Builds the HTTP client (unless a transport was injected) and proves
    /// the token and account with `SELECT 1`.
    async fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Ok(());
        }
        if self.transport.is_none() {
            self.transport = Some(Box::new(self.build_client()?));
        }
        let Some(transport) = self.transport.as_deref() else {
            return Err(DbInspectError::connection("Snowflake transport unavailable"));
        };

        match statement::run(transport, &self.config, "SELECT 1", &[]).await {
            Ok(_) => {
                self.connected = true;
                tracing::info!("Connected to {}", self.config);
                Ok(())
            }
            Err(DbInspectError::QueryExecution { context, .. }) => Err(DbInspectError::connection(
                format!("Snowflake session check failed: {context}"),
            )),
            Err(e) => Err(e),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.connected {
            tracing::info!("Closed Snowflake session for {}", self.config);
        }
        self.connected = false;
        self.transport = None;
        Ok(())
    }

    async fn execute(&self, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>> {
        assert_read_only(sql)?;
        let transport = match (self.connected, self.transport.as_deref()) {
            (true, Some(transport)) => transport,
            _ => {
                return Err(DbInspectError::connection(
                    "Snowflake connector is not connected",
                ));
            }
        };

        tracing::debug!("Snowflake query: {}", sql);
        statement::run(transport, &self.config, sql, params).await
    }

    async fn list_schemas(&self) -> Result<Vec<String>> {
        metadata::list_schemas(self).await
    }

    async fn list_tables(&self, schema: Option<&str>) -> Result<Vec<TableMetadata>> {
        metadata::list_tables(self, &self.default_schema(schema)).await
    }

    async fn list_columns(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ColumnMetadata>> {
        metadata::list_columns(self, table, &self.default_schema(schema)).await
    }

    async fn list_foreign_keys(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ForeignKeyRef>> {
        metadata::list_foreign_keys(self, table, &self.default_schema(schema)).await
    }

    async fn list_indexes(&self, table: &str, schema: Option<&str>) -> Result<Vec<IndexInfo>> {
        metadata::list_indexes(self, table, &self.default_schema(schema)).await
    }

    /// Unquoted upper-case `SCHEMA.TABLE`, resolved case-insensitively.
    fn qualified_table(&self, table: &str, schema: Option<&str>) -> String {
        format!(
            "{}.{}",
            self.default_schema(schema).to_uppercase(),
            table.to_uppercase()
        )
    }

    fn type_classifier(&self) -> &dyn TypeClassifier {
        &self.classifier
    }
}
