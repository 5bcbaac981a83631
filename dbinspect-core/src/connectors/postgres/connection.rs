//! PostgreSQL pool management.

use crate::Result;
use crate::connectors::ConnectionConfig;
use crate::error::DbInspectError;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

/// Port used when the configuration does not name one.
pub const DEFAULT_PORT: u16 = 5432;

const MAX_CONNECTIONS: u32 = 2;

/// Creates the pool and proves it with `SELECT 1`.
///
/// # Session Settings
/// Applied to every pooled connection through `after_connect`:
/// - `statement_timeout` from the configured query timeout
/// - `default_transaction_read_only = on`
/// - `application_name` for server-side attribution
/// - `timezone = 'UTC'` for consistent timestamps
pub(crate) async fn create_pool(config: &ConnectionConfig) -> Result<PgPool> {
    use sqlx::Executor;

    let host = config.host.clone().unwrap_or_default();
    let port = config.port.unwrap_or(DEFAULT_PORT);

    let mut options = PgConnectOptions::new()
        .host(&host)
        .port(port)
        .application_name(&application_name());
    if let Some(database) = &config.database {
        options = options.database(database);
    }
    if let Some(credentials) = config.credentials() {
        options = options.username(credentials.username());
        if let Some(password) = credentials.password() {
            options = options.password(password);
        }
    } else if let Some(username) = &config.username {
        options = options.username(username);
    }

    let statement_timeout_ms = config.query_timeout.as_millis();

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(config.connect_timeout)
        .test_before_acquire(true)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                conn.execute(format!("SET statement_timeout = {statement_timeout_ms}").as_str())
                    .await?;
                conn.execute("SET default_transaction_read_only = on").await?;
                conn.execute("SET timezone = 'UTC'").await?;
                Ok(())
            })
        })
        .connect_with(options)
        .await
        .map_err(|e| connect_error(config, e))?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| connect_error(config, e))?;

    tracing::info!("Connected to {} (read-only session)", config);
    Ok(pool)
}

fn application_name() -> String {
    format!("dbinspect-{}", env!("CARGO_PKG_VERSION"))
}

/// Turns a driver failure during connect into an actionable `Connection`
/// error. The message names the target but never the password.
pub(crate) fn connect_error(config: &ConnectionConfig, error: sqlx::Error) -> DbInspectError {
    let target = format!(
        "{}:{}",
        config.host.as_deref().unwrap_or("<unknown>"),
        config.port.unwrap_or(DEFAULT_PORT)
    );

    let hint = match &error {
        sqlx::Error::Database(db_error) => {
            sqlstate_hint(db_error.code().as_deref(), config).unwrap_or_else(|| {
                format!("server at {target} refused the session: {}", db_error.message())
            })
        }
        sqlx::Error::Io(_) => format!(
            "could not reach {target}; check the host, port and that the server accepts TCP connections"
        ),
        sqlx::Error::Tls(_) => format!("TLS negotiation with {target} failed"),
        sqlx::Error::PoolTimedOut => format!(
            "timed out after {}s connecting to {target}",
            config.connect_timeout.as_secs()
        ),
        other => format!("could not connect to {target}: {other}"),
    };

    DbInspectError::connection_failed(hint, error)
}

/// Actionable text for the SQLSTATE codes users hit while connecting.
pub(crate) fn sqlstate_hint(code: Option<&str>, config: &ConnectionConfig) -> Option<String> {
    let user = config
        .credentials()
        .map(|c| c.username().to_string())
        .or_else(|| config.username.clone())
        .unwrap_or_else(|| "<default>".to_string());
    let database = config.database.as_deref().unwrap_or("<default>");

    match code? {
        "28P01" | "28000" => Some(format!(
            "authentication failed for user '{user}'; check the username and password"
        )),
        "3D000" => Some(format!("database '{database}' does not exist")),
        "42501" => Some(format!(
            "user '{user}' lacks permission to connect to database '{database}'"
        )),
        "53300" => Some("the server has no free connection slots".to_string()),
        "57P03" => Some("the server is starting up or shutting down".to_string()),
        _ => None,
    }
}
