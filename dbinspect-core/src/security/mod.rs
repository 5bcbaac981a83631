//! Credential protection, connection-string parsing and the read-only guard.
//!
//! # Security Guarantees
//! - Credentials are stored in `Zeroizing` containers for automatic memory clearing
//! - Connection strings are parsed so secrets never travel inside a URL string
//! - Every statement is checked against a read-only allow-list before it
//!   reaches a backend
//!
//! # Module Structure
//! - `credentials`: Secure credential container with automatic memory zeroing
//! - `connection`: Connection string parsing into a `ConnectionConfig`
//! - `read_only`: Leading-keyword allow-list applied by every connector

mod connection;
mod credentials;
mod read_only;

pub use connection::parse_connection_string;
pub use credentials::Credentials;
pub use read_only::{READ_ONLY_KEYWORDS, assert_read_only, leading_keyword};
