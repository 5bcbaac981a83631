//! SQLite pool creation.
//!
//! # Security Features
//! - Opens the file with `SQLITE_OPEN_READONLY`; writes fail inside SQLite
//!   even if they got past the statement guard
//! - Never creates a missing file

use crate::Result;
use crate::connectors::ConnectionConfig;
use crate::error::DbInspectError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;

/// Opens a single-connection, read-only pool on the configured file.
///
/// # Errors
/// Returns `Connection` naming the path when the file does not exist or
/// cannot be opened as a database.
pub async fn open_read_only_pool(config: &ConnectionConfig) -> Result<SqlitePool> {
    let path = config
        .file_path
        .as_deref()
        .ok_or_else(|| DbInspectError::configuration("SQLite requires a database file path"))?;

    ensure_database_file(path)?;

    let options = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .create_if_missing(false)
        .busy_timeout(config.query_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await
        .map_err(|e| {
            DbInspectError::connection_failed(
                format!("Failed to open SQLite database '{}'", path.display()),
                e,
            )
        })?;

    // Opening is lazy about the header; force a read so a non-database file
    // fails here instead of on the first query.
    sqlx::query("SELECT COUNT(*) FROM sqlite_master")
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            DbInspectError::connection_failed(
                format!("'{}' is not a readable SQLite database", path.display()),
                e,
            )
        })?;

    tracing::info!("Opened SQLite database {} (read-only)", path.display());
    Ok(pool)
}

fn ensure_database_file(path: &Path) -> Result<()> {
    if path.is_file() {
        return Ok(());
    }
    let reason = if path.exists() {
        "is not a regular file"
    } else {
        "does not exist"
    };
    Err(DbInspectError::connection(format!(
        "SQLite database file '{}' {}",
        path.display(),
        reason
    )))
}
