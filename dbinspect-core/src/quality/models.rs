//! Data quality report models.
//!
//! Reports carry statistics and messages only; sample values appear solely
//! as the short top-value strings already present in `ColumnStats`.

use crate::stats::ColumnStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issue severity, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Broken integrity, e.g. duplicate primary keys
    Critical,
    /// Data contradicting its declared constraints
    High,
    /// Gaps worth scheduling a fix for
    Medium,
    /// Informational
    Low,
}

impl Severity {
    /// Sort rank: critical 0, high 1, medium 2, low 3.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }

    /// Lowercase name as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding with remediation guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    /// How urgent the finding is
    pub severity: Severity,
    /// `None` for table-level findings.
    pub column: Option<String>,
    /// Human-readable description of the problem
    pub message: String,
    /// Remediation steps, possibly with SQL. May be empty.
    #[serde(default)]
    pub fix: String,
}

impl QualityIssue {
    /// Creates an issue without remediation text.
    pub fn new(severity: Severity, column: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity,
            column: column.map(str::to_string),
            message: message.into(),
            fix: String::new(),
        }
    }

    /// Builder method to attach remediation text.
    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = fix.into();
        self
    }
}

/// Informational cardinality label; never an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniquenessLabel {
    /// Every non-null value is distinct
    FullyUnique,
    /// Uniqueness below the configured low-cardinality threshold
    LowCardinality,
}

/// Per-column scores and the statistics they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnQualityMetrics {
    /// Column name as reported by the catalog
    pub column_name: String,
    /// Declared type as reported by the catalog
    pub data_type: String,
    /// Part of the primary key
    pub is_primary_key: bool,
    /// Declared nullable
    pub is_nullable: bool,
    /// Raw statistics, flattened into the column entry
    #[serde(flatten)]
    pub stats: ColumnStats,
    /// Completeness percentage; 100 when it could not be measured
    pub completeness_score: f64,
    /// Distinct share of non-null values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniqueness_score: Option<f64>,
    /// Cardinality label, when one applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniqueness_label: Option<UniquenessLabel>,
    /// `min to max (avg: x)` for numeric columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_summary: Option<String>,
}

/// Facts about the table as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableLevelFacts {
    /// Row count observed by the statistics queries
    pub row_count: u64,
    /// Whether a primary key is declared
    pub has_primary_key: bool,
    /// Primary key columns in ordinal order
    pub primary_key_columns: Vec<String>,
    /// Absent when the table has no temporal column.
    pub freshness_score: Option<f64>,
    /// Temporal column the freshness score was read from
    pub freshness_column: Option<String>,
}

/// Letter grade for a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    /// 95 and above
    #[serde(rename = "A+")]
    APlus,
    /// 90 to below 95
    #[serde(rename = "A")]
    A,
    /// 85 to below 90
    #[serde(rename = "A-")]
    AMinus,
    /// 80 to below 85
    #[serde(rename = "B+")]
    BPlus,
    /// 75 to below 80
    #[serde(rename = "B")]
    B,
    /// 70 to below 75
    #[serde(rename = "B-")]
    BMinus,
    /// 65 to below 70
    #[serde(rename = "C+")]
    CPlus,
    /// 60 to below 65
    #[serde(rename = "C")]
    C,
    /// 55 to below 60
    #[serde(rename = "C-")]
    CMinus,
    /// 50 to below 55
    #[serde(rename = "D")]
    D,
    /// Below 50
    #[serde(rename = "F")]
    F,
}

impl Grade {
    /// Inclusive lower bounds, best grade first.
    const BANDS: [(f64, Grade); 10] = [
        (95.0, Grade::APlus),
        (90.0, Grade::A),
        (85.0, Grade::AMinus),
        (80.0, Grade::BPlus),
        (75.0, Grade::B),
        (70.0, Grade::BMinus),
        (65.0, Grade::CPlus),
        (60.0, Grade::C),
        (55.0, Grade::CMinus),
        (50.0, Grade::D),
    ];

    /// Maps a score to its grade.
    ///
    /// # Example
    /// ```rust
    /// use dbinspect_core::quality::Grade;
    ///
    /// assert_eq!(Grade::from_score(95.0), Grade::APlus);
    /// assert_eq!(Grade::from_score(49.9), Grade::F);
    /// ```
    pub fn from_score(score: f64) -> Self {
        Self::BANDS
            .iter()
            .find(|(bound, _)| score >= *bound)
            .map_or(Grade::F, |(_, grade)| *grade)
    }

    /// Letter as serialized, e.g. `B-`.
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time quality report for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableQualityReport {
    /// Analyzed table
    pub table_name: String,
    /// Schema the table was read from, when given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// When the analysis started
    pub analyzed_at: DateTime<Utc>,
    /// Per-column metrics in ordinal order.
    pub column_metrics: Vec<ColumnQualityMetrics>,
    /// Table-wide facts
    pub table_level: TableLevelFacts,
    /// Mean of all contributing scores, one decimal.
    pub overall_score: f64,
    /// Grade of the unrounded mean
    pub grade: Grade,
    /// Sorted by severity; discovery order within a severity.
    pub issues: Vec<QualityIssue>,
    /// Positive findings worth reporting
    pub highlights: Vec<String>,
}

impl TableQualityReport {
    /// Issues of exactly `severity`.
    pub fn issues_with(&self, severity: Severity) -> impl Iterator<Item = &QualityIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    /// Metrics of the column named `name`.
    pub fn column(&self, name: &str) -> Option<&ColumnQualityMetrics> {
        self.column_metrics.iter().find(|m| m.column_name == name)
    }
}

/// Issue tagged with the table it was found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableIssue {
    /// Table the issue belongs to
    pub table: String,
    /// The issue itself, flattened
    #[serde(flatten)]
    pub issue: QualityIssue,
}

/// Count of tables per score band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    /// Score ≥ 90
    pub excellent: usize,
    /// 75 ≤ score < 90
    pub good: usize,
    /// 60 ≤ score < 75
    pub fair: usize,
    /// Score < 60
    pub poor: usize,
}

/// Database-wide aggregate over table reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseQualityOverview {
    /// Mean table score, one decimal
    pub database_score: f64,
    /// Grade of the unrounded mean table score
    pub database_grade: Grade,
    /// Tables listed in the database (or requested)
    pub total_tables: usize,
    /// Tables with a report
    pub tables_analyzed: usize,
    /// Critical issues across all reports
    pub critical_issues: usize,
    /// High issues across all reports
    pub high_issues: usize,
    /// Most urgent issues, critical first
    pub top_issues: Vec<TableIssue>,
    /// Highest-scoring table
    pub best_table: String,
    /// Lowest-scoring table
    pub worst_table: String,
    /// Tables per score band
    pub score_distribution: ScoreDistribution,
}

/// Reports for every table that could be analyzed, plus their overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseAnalysis {
    /// One report per analyzed table, in listing order
    pub reports: Vec<TableQualityReport>,
    /// `None` when no table could be analyzed.
    pub overview: Option<DatabaseQualityOverview>,
    /// Tables whose metadata could not be read.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_tables: Vec<String>,
}
