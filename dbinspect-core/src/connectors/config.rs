//! Database connection configuration.
//!
//! `ConnectionConfig` selects one backend and carries its parameters. Every
//! session it opens is read-only; there is no switch to turn that off.

use crate::models::BackendKind;
use crate::security::Credentials;
use crate::stats::TypeCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a database connection.
///
/// # Security
/// Credentials are never serialized and never shown by `Display`. `Debug`
/// prints the username only.
///
/// # Example
/// ```rust
/// use dbinspect_core::ConnectionConfig;
///
/// let config = ConnectionConfig::postgres("localhost".to_string())
///     .with_port(5432)
///     .with_database("mydb".to_string())
///     .with_username("admin".to_string());
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.to_string(), "postgresql://localhost:5432/mydb");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Backend this configuration targets
    pub backend: BackendKind,
    /// SQLite database file
    pub file_path: Option<PathBuf>,
    /// Server host address
    pub host: Option<String>,
    /// Optional port number
    pub port: Option<u16>,
    /// Optional database name
    pub database: Option<String>,
    /// Optional username (secret handled separately)
    pub username: Option<String>,
    /// Snowflake account identifier (`orgname-accountname` or `xy12345.us-east-1`)
    pub account: Option<String>,
    /// Snowflake virtual warehouse
    pub warehouse: Option<String>,
    /// Default schema for listings and qualified names
    pub schema: Option<String>,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Query timeout duration
    pub query_timeout: Duration,
    /// Declared type name (case-insensitive) to category, consulted before
    /// the substring heuristic
    #[serde(default)]
    pub type_overrides: BTreeMap<String, TypeCategory>,
    #[serde(skip)]
    credentials: Option<Credentials>,
}

impl ConnectionConfig {
    /// Creates a configuration for `backend` with safe defaults.
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            file_path: None,
            host: None,
            port: None,
            database: None,
            username: None,
            account: None,
            warehouse: None,
            schema: None,
            connect_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(30),
            type_overrides: BTreeMap::new(),
            credentials: None,
        }
    }

    /// SQLite database file.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self::new(BackendKind::Sqlite).with_file_path(path)
    }

    /// PostgreSQL server.
    pub fn postgres(host: String) -> Self {
        Self::new(BackendKind::Postgresql).with_host(host)
    }

    /// Snowflake account.
    pub fn snowflake(account: String) -> Self {
        Self::new(BackendKind::Snowflake).with_account(account)
    }

    /// Validates connection configuration parameters.
    ///
    /// # Errors
    /// Returns a configuration error naming the first invalid field.
    pub fn validate(&self) -> crate::Result<()> {
        use crate::error::DbInspectError;

        match self.backend {
            BackendKind::Sqlite => {
                if self
                    .file_path
                    .as_ref()
                    .is_none_or(|p| p.as_os_str().is_empty())
                {
                    return Err(DbInspectError::configuration(
                        "file_path is required for SQLite",
                    ));
                }
            }
            BackendKind::Snowflake => {
                if self.account.as_deref().is_none_or(str::is_empty) {
                    return Err(DbInspectError::configuration(
                        "account is required for Snowflake",
                    ));
                }
                if !self.credentials.as_ref().is_some_and(Credentials::has_password) {
                    return Err(DbInspectError::configuration(
                        "a programmatic access token is required for Snowflake",
                    ));
                }
            }
            BackendKind::Postgresql | BackendKind::Mysql | BackendKind::Sqlserver => {
                if self.host.as_deref().is_none_or(str::is_empty) {
                    return Err(DbInspectError::configuration("host cannot be empty"));
                }
            }
        }

        if self.port == Some(0) {
            return Err(DbInspectError::configuration("port must be greater than 0"));
        }

        if self.connect_timeout.is_zero() {
            return Err(DbInspectError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        if self.query_timeout.is_zero() {
            return Err(DbInspectError::configuration(
                "query_timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Builder method to set the SQLite file path.
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Builder method to set host.
    pub fn with_host(mut self, host: String) -> Self {
        self.host = Some(host);
        self
    }

    /// Builder method to set port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder method to set database.
    pub fn with_database(mut self, database: String) -> Self {
        self.database = Some(database);
        self
    }

    /// Builder method to set username.
    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    /// Builder method to set the Snowflake account identifier.
    pub fn with_account(mut self, account: String) -> Self {
        self.account = Some(account);
        self
    }

    /// Builder method to set the Snowflake warehouse.
    pub fn with_warehouse(mut self, warehouse: String) -> Self {
        self.warehouse = Some(warehouse);
        self
    }

    /// Builder method to set the default schema.
    pub fn with_schema(mut self, schema: String) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Builder method to set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builder method to set the query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Builder method to pin a declared type name to a category.
    pub fn with_type_override(mut self, type_name: &str, category: TypeCategory) -> Self {
        self.type_overrides
            .insert(type_name.trim().to_lowercase(), category);
        self
    }

    /// Builder method to attach credentials.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Credentials attached to this configuration, if any.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Schema to use when a call does not name one.
    pub fn effective_schema(&self) -> String {
        self.schema
            .clone()
            .unwrap_or_else(|| self.backend.default_schema().to_string())
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.backend {
            BackendKind::Sqlite => write!(
                f,
                "sqlite:{}",
                self.file_path
                    .as_ref()
                    .map_or_else(String::new, |p| p.display().to_string())
            ),
            BackendKind::Snowflake => write!(
                f,
                "snowflake://{}{}{}",
                self.account.as_deref().unwrap_or_default(),
                self.database
                    .as_ref()
                    .map_or_else(String::new, |db| format!("/{}", db)),
                self.schema
                    .as_ref()
                    .map_or_else(String::new, |s| format!("/{}", s))
            ),
            other => write!(
                f,
                "{}://{}{}{}",
                other,
                self.host.as_deref().unwrap_or_default(),
                self.port.map_or_else(String::new, |p| format!(":{}", p)),
                self.database
                    .as_ref()
                    .map_or_else(String::new, |db| format!("/{}", db))
            ),
        }
        // Intentionally omit username and never include credentials
    }
}
