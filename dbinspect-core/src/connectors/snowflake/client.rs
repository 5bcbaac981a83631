//! HTTP transport for the Snowflake SQL API (`/api/v2/statements`).
//!
//! The connector talks to a [`StatementTransport`] so statement handling
//! can be exercised without a network. [`SqlApiClient`] is the reqwest
//! implementation.

use crate::Result;
use crate::error::DbInspectError;
use crate::security::Credentials;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Host suffix users often paste into the account field.
pub const ACCOUNT_HOST_SUFFIX: &str = ".snowflakecomputing.com";

/// Appended to connection failures; most of them come from a malformed
/// account identifier.
pub const ACCOUNT_FORMAT_HINT: &str = "Verify the account identifier, token, warehouse and database. \
     Account format should be 'orgname-accountname' or 'xy12345.us-east-1' \
     without .snowflakecomputing.com";

/// Raw HTTP reply: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

impl ApiResponse {
    /// Creates a reply from its parts.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The two SQL API calls the connector needs.
#[async_trait]
pub trait StatementTransport: Send + Sync {
    /// Submits a statement (`POST /api/v2/statements`).
    async fn post_statement(&self, body: &Value, request_id: &str) -> Result<ApiResponse>;

    /// Polls a statement or fetches one result partition
    /// (`GET /api/v2/statements/{handle}`).
    async fn get_statement(&self, handle: &str, partition: Option<usize>) -> Result<ApiResponse>;
}

/// SQL API client authenticated with a programmatic access token.
pub struct SqlApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl std::fmt::Debug for SqlApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SqlApiClient {
    /// Builds the HTTP client for `account`.
    ///
    /// # Errors
    /// Returns `Connection` if the TLS backend cannot be initialised.
    pub fn new(
        account: &str,
        credentials: Credentials,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(concat!("dbinspect/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DbInspectError::connection_failed("Failed to build HTTP client", e))?;

        Ok(Self {
            http,
            base_url: format!("https://{}{}", normalize_account(account), ACCOUNT_HOST_SUFFIX),
            credentials,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(self.credentials.password().unwrap_or_default())
            .header("X-Snowflake-Authorization-Token-Type", "PROGRAMMATIC_ACCESS_TOKEN")
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn read(&self, response: std::result::Result<reqwest::Response, reqwest::Error>) -> Result<ApiResponse> {
        let response = response.map_err(|e| transport_error(&self.base_url, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&self.base_url, e))?;
        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl StatementTransport for SqlApiClient {
    async fn post_statement(&self, body: &Value, request_id: &str) -> Result<ApiResponse> {
        let url = format!("{}/api/v2/statements", self.base_url);
        let request = self
            .authorized(self.http.post(&url))
            .query(&[("requestId", request_id)])
            .json(body);
        self.read(request.send().await).await
    }

    async fn get_statement(&self, handle: &str, partition: Option<usize>) -> Result<ApiResponse> {
        let url = format!("{}/api/v2/statements/{}", self.base_url, handle);
        let mut request = self.authorized(self.http.get(&url));
        if let Some(partition) = partition {
            request = request.query(&[("partition", partition)]);
        }
        self.read(request.send().await).await
    }
}

/// Strips a pasted host suffix and surrounding whitespace from an account
/// identifier.
pub fn normalize_account(account: &str) -> String {
    let trimmed = account.trim().trim_start_matches("https://").trim_end_matches('/');
    let lower = trimmed.to_ascii_lowercase();
    match lower.strip_suffix(ACCOUNT_HOST_SUFFIX) {
        Some(stripped) => {
            tracing::warn!(
                "Account identifier should not include {}; using '{}'",
                ACCOUNT_HOST_SUFFIX,
                stripped
            );
            trimmed[..stripped.len()].to_string()
        }
        None => trimmed.to_string(),
    }
}

fn transport_error(base_url: &str, error: reqwest::Error) -> DbInspectError {
    let reason = if error.is_timeout() {
        "the request timed out"
    } else if error.is_connect() {
        "the host could not be reached"
    } else {
        "the HTTP exchange failed"
    };
    DbInspectError::connection_failed(
        format!("Snowflake request to {base_url} failed: {reason}. {ACCOUNT_FORMAT_HINT}"),
        error,
    )
}
