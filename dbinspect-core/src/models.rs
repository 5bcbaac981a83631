//! Normalized metadata records shared by every connector.
//!
//! Each backend reads its own catalog (`sqlite_master`, `INFORMATION_SCHEMA`,
//! `pg_catalog`) and reports the result through these types so the
//! statistics engine and the quality analyzer never see backend-specific
//! shapes.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Database backends recognized by dbinspect.
///
/// `mysql` and `sqlserver` are accepted names without an implementation;
/// constructing a connector for them fails with `UnsupportedBackend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite database file
    Sqlite,
    /// PostgreSQL server
    Postgresql,
    /// Snowflake warehouse over the SQL API
    Snowflake,
    /// MySQL (recognized, not implemented)
    Mysql,
    /// Microsoft SQL Server (recognized, not implemented)
    Sqlserver,
}

impl BackendKind {
    /// Every recognized backend name, implemented or not.
    pub const ALL: [BackendKind; 5] = [
        BackendKind::Sqlite,
        BackendKind::Postgresql,
        BackendKind::Sqlserver,
        BackendKind::Snowflake,
        BackendKind::Mysql,
    ];

    /// Canonical lowercase name used in configuration and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Postgresql => "postgresql",
            BackendKind::Snowflake => "snowflake",
            BackendKind::Mysql => "mysql",
            BackendKind::Sqlserver => "sqlserver",
        }
    }

    /// Schema used when the caller does not name one.
    pub fn default_schema(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "main",
            BackendKind::Snowflake => "PUBLIC",
            BackendKind::Sqlserver => "dbo",
            BackendKind::Postgresql | BackendKind::Mysql => "public",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = crate::error::DbInspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(BackendKind::Sqlite),
            "postgresql" | "postgres" => Ok(BackendKind::Postgresql),
            "snowflake" => Ok(BackendKind::Snowflake),
            "mysql" => Ok(BackendKind::Mysql),
            "sqlserver" | "mssql" => Ok(BackendKind::Sqlserver),
            other => Err(crate::error::DbInspectError::unsupported_backend(
                other,
                &crate::connectors::supported_backends(),
            )),
        }
    }
}

/// Table or view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableKind {
    /// Base table
    Table,
    /// View
    View,
}

/// Table-level catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table name as stored in the catalog
    pub name: String,
    /// Table or view
    pub kind: TableKind,
    /// Owning schema, when the backend has schemas
    pub schema: Option<String>,
    /// Row count (catalog estimate or exact count, per backend)
    pub row_count: u64,
    /// Storage size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Table comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Snowflake clustering key expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustering_key: Option<String>,
}

impl TableMetadata {
    /// Creates a base table entry with no optional facts.
    pub fn new(name: impl Into<String>, schema: Option<String>, row_count: u64) -> Self {
        Self {
            name: name.into(),
            kind: TableKind::Table,
            schema,
            row_count,
            size_bytes: None,
            comment: None,
            clustering_key: None,
        }
    }
}

/// Column-level catalog entry.
///
/// `ordinal_position` is 1-based on every backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name
    pub name: String,
    /// Declared type as the backend reports it
    pub data_type: String,
    /// Whether NULL is allowed
    pub is_nullable: bool,
    /// Default expression, verbatim
    pub default_value: Option<String>,
    /// Part of the primary key
    pub is_primary_key: bool,
    /// 1-based position in the table
    pub ordinal_position: u32,
    /// Maximum length for character types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_maximum_length: Option<u64>,
    /// Precision for numeric types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_precision: Option<u32>,
    /// Scale for numeric types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_scale: Option<u32>,
    /// Column comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ColumnMetadata {
    /// Creates a nullable, non-key column at position 1.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default_value: None,
            is_primary_key: false,
            ordinal_position: 1,
            character_maximum_length: None,
            numeric_precision: None,
            numeric_scale: None,
            comment: None,
        }
    }

    /// Builder method to set nullability.
    pub fn with_nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    /// Builder method to mark primary-key membership.
    pub fn with_primary_key(mut self, is_primary_key: bool) -> Self {
        self.is_primary_key = is_primary_key;
        self
    }

    /// Builder method to set the 1-based ordinal position.
    pub fn with_ordinal_position(mut self, position: u32) -> Self {
        self.ordinal_position = position;
        self
    }
}

/// One column of a foreign key. Rules are empty strings when the backend
/// cannot report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referencing column
    pub column: String,
    /// Referenced table
    pub referenced_table: String,
    /// Referenced column
    pub referenced_column: String,
    /// ON DELETE rule, e.g. `CASCADE`
    pub on_delete: String,
    /// ON UPDATE rule
    pub on_update: String,
}

/// Index or index-like construct with its columns in key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Index name
    pub name: String,
    /// Enforces uniqueness
    pub is_unique: bool,
    /// Indexed columns in key order
    pub columns: Vec<String>,
}

/// A result row: column name to JSON value, in result-set column order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Positional bind value for `execute`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// Double-precision float
    Float(f64),
    /// Text value
    Text(String),
}

impl From<&str> for QueryParam {
    fn from(value: &str) -> Self {
        QueryParam::Text(value.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(value: String) -> Self {
        QueryParam::Text(value)
    }
}

impl From<i64> for QueryParam {
    fn from(value: i64) -> Self {
        QueryParam::Int(value)
    }
}

impl From<f64> for QueryParam {
    fn from(value: f64) -> Self {
        QueryParam::Float(value)
    }
}

impl From<bool> for QueryParam {
    fn from(value: bool) -> Self {
        QueryParam::Bool(value)
    }
}

impl<T: Into<QueryParam>> From<Option<T>> for QueryParam {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryParam::Null, Into::into)
    }
}
