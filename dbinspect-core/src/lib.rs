//! Core library for dbinspect.
//!
//! dbinspect connects to a database through a uniform read-only interface,
//! computes per-column statistics with portable SQL and turns them into
//! severity-ranked data-quality findings with concrete remediation hints.
//!
//! # Security Guarantees
//! - Every statement passes a read-only keyword guard before it reaches a
//!   backend; sessions are additionally opened read-only where possible
//! - Credentials live in zeroizing containers and never appear in logs,
//!   errors or reports
//! - No telemetry; the only network traffic goes to the inspected database
//!
//! # Architecture
//! - `connectors`: the `DatabaseConnector` trait, its factory and one module
//!   per backend (feature-gated)
//! - `stats`: backend-agnostic column statistics written against the trait
//! - `quality`: table scoring, issues and the database overview
//! - `session`: explicit, caller-owned connection lifecycle

pub mod connectors;
pub mod error;
pub mod logging;
pub mod models;
pub mod quality;
pub mod security;
pub mod session;
pub mod stats;

// Re-export commonly used types
pub use connectors::{ConnectionConfig, DatabaseConnector, create_connector, supported_backends};
pub use error::{DbInspectError, Result};
pub use models::{
    BackendKind, ColumnMetadata, ForeignKeyRef, IndexInfo, QueryParam, Row, TableKind,
    TableMetadata,
};
pub use quality::{
    DatabaseAnalysis, DatabaseQualityOverview, QualityAnalyzer, QualityConfig, QualityIssue,
    Severity, TableQualityReport,
};
pub use security::{Credentials, parse_connection_string};
pub use session::Session;
pub use stats::{ColumnStats, compute_column_stats};
