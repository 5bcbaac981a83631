//! Data quality assessment.
//!
//! Scores each table from its column statistics:
//! - **Completeness**: NULLs in declared NOT NULL columns and sparse columns
//! - **Key integrity**: missing, duplicated or non-unique primary keys
//! - **Freshness**: age of the newest value in the first temporal column
//! - **Range checks**: negative values in price columns
//!
//! Every finding carries a severity and a remediation hint. Table reports
//! aggregate into a [`DatabaseQualityOverview`].
//!
//! # Security Guarantees
//! - Reports carry counts, ratios and the statistics' short top values only
//! - All SQL runs through the connector's read-only guard
//!
//! # Example
//! ```rust,ignore
//! use dbinspect_core::quality::QualityAnalyzer;
//!
//! let analyzer = QualityAnalyzer::with_defaults();
//! let analysis = analyzer.analyze_database(&*connector, None).await?;
//! if let Some(overview) = analysis.overview {
//!     println!("{} ({})", overview.database_score, overview.database_grade);
//! }
//! ```

mod analyzer;
mod config;
pub mod freshness;
mod models;
mod overview;
mod scoring;

// Re-export public API
pub use analyzer::QualityAnalyzer;
pub use config::{ConfigValidationError, QualityConfig};
pub use models::{
    ColumnQualityMetrics, DatabaseAnalysis, DatabaseQualityOverview, Grade, QualityIssue,
    ScoreDistribution, Severity, TableIssue, TableLevelFacts, TableQualityReport,
    UniquenessLabel,
};
pub use overview::{DEFAULT_TOP_ISSUE_LIMIT, database_overview};
