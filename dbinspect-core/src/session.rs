//! Explicit inspection sessions.
//!
//! A [`Session`] owns one connected connector for its whole lifetime. Callers
//! open it, pass it by reference into analyses and close it; there is no
//! global registry of live connections.

use crate::Result;
use crate::connectors::{ConnectionConfig, DatabaseConnector, create_connector};
use crate::models::BackendKind;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

/// One open, read-only connection to a database.
pub struct Session {
    id: Uuid,
    opened_at: DateTime<Utc>,
    connector: Box<dyn DatabaseConnector>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("opened_at", &self.opened_at)
            .field("backend", &self.connector.backend())
            .field("target", &self.connector.config().to_string())
            .finish()
    }
}

impl Session {
    /// Creates the connector for `config` and connects it.
    ///
    /// # Errors
    /// - `UnsupportedBackend` or `Configuration` from connector creation
    /// - `Connection` when the backend cannot be reached
    pub async fn open(config: ConnectionConfig) -> Result<Self> {
        Self::from_connector(create_connector(config)?).await
    }

    /// Connects an already built connector and wraps it in a session.
    ///
    /// # Errors
    /// Returns the connector's `connect` error.
    pub async fn from_connector(mut connector: Box<dyn DatabaseConnector>) -> Result<Self> {
        if !connector.is_connected() {
            connector.connect().await?;
        }
        let session = Self {
            id: Uuid::new_v4(),
            opened_at: Utc::now(),
            connector,
        };
        info!(
            "Session {} opened ({})",
            session.id,
            session.connector.backend()
        );
        Ok(session)
    }

    /// Unique identifier of this session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the session was opened.
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Backend of the underlying connector.
    pub fn backend(&self) -> BackendKind {
        self.connector.backend()
    }

    /// The connected connector.
    pub fn connector(&self) -> &dyn DatabaseConnector {
        self.connector.as_ref()
    }

    /// Closes the backend session.
    ///
    /// # Errors
    /// Returns the connector's `close` error; the session is consumed either
    /// way.
    pub async fn close(mut self) -> Result<()> {
        let result = self.connector.close().await;
        match &result {
            Ok(()) => info!("Session {} closed", self.id),
            Err(e) => warn!("Session {} did not close cleanly: {}", self.id, e),
        }
        result
    }
}
