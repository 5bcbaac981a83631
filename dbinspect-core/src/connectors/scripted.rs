//! In-memory connector answering queries from a script, for engine and
//! analyzer tests.

use super::{ConnectionConfig, DatabaseConnector};
use crate::Result;
use crate::error::DbInspectError;
use crate::models::{
    BackendKind, ColumnMetadata, ForeignKeyRef, IndexInfo, QueryParam, Row, TableMetadata,
};
use crate::security::assert_read_only;
use crate::stats::{HeuristicClassifier, TypeClassifier};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

enum Reply {
    Rows(Vec<Row>),
    Fail(String),
}

/// Answers each statement with the first rule whose pattern it contains.
pub(crate) struct ScriptedConnector {
    config: ConnectionConfig,
    classifier: HeuristicClassifier,
    rules: Vec<(String, Reply)>,
    tables: Vec<TableMetadata>,
    columns: Vec<(String, Vec<ColumnMetadata>)>,
    executed: Mutex<Vec<String>>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Self {
        Self {
            config: ConnectionConfig::sqlite("scripted.db"),
            classifier: HeuristicClassifier::new(),
            rules: Vec::new(),
            tables: Vec::new(),
            columns: Vec::new(),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn respond(mut self, pattern: &str, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .map(|value| match value {
                Value::Object(map) => map,
                other => panic!("scripted rows must be objects, got {other}"),
            })
            .collect();
        self.rules.push((pattern.to_string(), Reply::Rows(rows)));
        self
    }

    pub(crate) fn fail(mut self, pattern: &str, message: &str) -> Self {
        self.rules
            .push((pattern.to_string(), Reply::Fail(message.to_string())));
        self
    }

    pub(crate) fn with_table(mut self, table: TableMetadata, columns: Vec<ColumnMetadata>) -> Self {
        self.columns.push((table.name.clone(), columns));
        self.tables.push(table);
        self
    }

    pub(crate) fn with_classifier(mut self, classifier: HeuristicClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.executed.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseConnector for ScriptedConnector {
    fn backend(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    async fn execute(&self, sql: &str, _params: &[QueryParam]) -> Result<Vec<Row>> {
        assert_read_only(sql)?;
        if let Ok(mut log) = self.executed.lock() {
            log.push(sql.to_string());
        }
        for (pattern, reply) in &self.rules {
            if sql.contains(pattern.as_str()) {
                return match reply {
                    Reply::Rows(rows) => Ok(rows.clone()),
                    Reply::Fail(message) => Err(DbInspectError::query_failed(message.clone())),
                };
            }
        }
        Err(DbInspectError::query_failed(format!(
            "no scripted response for: {sql}"
        )))
    }

    async fn list_schemas(&self) -> Result<Vec<String>> {
        Ok(vec!["main".to_string()])
    }

    async fn list_tables(&self, _schema: Option<&str>) -> Result<Vec<TableMetadata>> {
        Ok(self.tables.clone())
    }

    async fn list_columns(
        &self,
        table: &str,
        _schema: Option<&str>,
    ) -> Result<Vec<ColumnMetadata>> {
        self.columns
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, columns)| columns.clone())
            .ok_or_else(|| DbInspectError::query_failed(format!("no such table: {table}")))
    }

    async fn list_foreign_keys(
        &self,
        _table: &str,
        _schema: Option<&str>,
    ) -> Result<Vec<ForeignKeyRef>> {
        Ok(Vec::new())
    }

    async fn list_indexes(&self, _table: &str, _schema: Option<&str>) -> Result<Vec<IndexInfo>> {
        Ok(Vec::new())
    }

    fn type_classifier(&self) -> &dyn TypeClassifier {
        &self.classifier
    }
}
