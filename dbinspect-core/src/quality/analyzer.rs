//! Quality analyzer facade.
//!
//! Turns column metadata plus freshly computed statistics into a scored,
//! explained [`TableQualityReport`]. All SQL goes through the connector, so
//! the same evaluation runs unchanged on every backend.

use super::config::QualityConfig;
use super::freshness::freshness_score;
use super::models::{
    ColumnQualityMetrics, DatabaseAnalysis, DatabaseQualityOverview, QualityIssue, Severity,
    TableLevelFacts, TableQualityReport, UniquenessLabel,
};
use super::overview::database_overview;
use super::scoring::{format_amount, mean_score, score_and_grade, sort_by_severity};
use crate::Result;
use crate::connectors::DatabaseConnector;
use crate::connectors::helpers::RowExt;
use crate::models::ColumnMetadata;
use crate::stats::ColumnStats;
use chrono::Utc;
use tracing::{debug, info, warn};

/// Score contributed by a table that declares a primary key.
const PRIMARY_KEY_SCORE: f64 = 100.0;

/// Findings accumulated while a table is evaluated.
#[derive(Debug, Default)]
struct Findings {
    issues: Vec<QualityIssue>,
    highlights: Vec<String>,
    scores: Vec<f64>,
}

/// Quality analyzer producing per-table reports and database overviews.
///
/// # Example
///
/// ```rust,ignore
/// use dbinspect_core::quality::QualityAnalyzer;
///
/// let analyzer = QualityAnalyzer::with_defaults();
/// let columns = connector.list_columns("orders", None).await?;
/// let report = analyzer.analyze_table(&*connector, "orders", &columns, None).await;
/// println!("{}: {} ({})", report.table_name, report.overall_score, report.grade);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QualityAnalyzer {
    config: QualityConfig,
}

impl QualityAnalyzer {
    /// Creates a new quality analyzer with the given configuration.
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Creates a new quality analyzer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(QualityConfig::default())
    }

    /// Returns a reference to the analyzer configuration.
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Analyzes one table.
    ///
    /// Never fails: statistics failures are recorded on the affected
    /// column, and failed composite-key or freshness queries fall back to
    /// their documented defaults.
    pub async fn analyze_table<C>(
        &self,
        connector: &C,
        table: &str,
        columns: &[ColumnMetadata],
        schema: Option<&str>,
    ) -> TableQualityReport
    where
        C: DatabaseConnector + ?Sized,
    {
        info!("Analyzing data quality of {}", table);
        let analyzed_at = Utc::now();
        let tbl = connector.qualified_table(table, schema);
        let primary_keys: Vec<&ColumnMetadata> =
            columns.iter().filter(|c| c.is_primary_key).collect();

        let mut findings = Findings::default();
        let mut column_metrics = Vec::with_capacity(columns.len());
        let mut row_count = 0;

        for column in columns {
            let stats = connector
                .column_stats(table, &column.name, &column.data_type, schema)
                .await;
            if let Some(total) = stats.total_rows.filter(|total| *total > 0) {
                row_count = total;
            }
            let col = connector.quote_identifier(&column.name);
            let metrics = self.evaluate_column(
                column,
                stats,
                primary_keys.len() == 1,
                &tbl,
                &col,
                &mut findings,
            );
            column_metrics.push(metrics);
        }

        // Primary key presence
        if primary_keys.is_empty() {
            findings.issues.push(
                QualityIssue::new(
                    Severity::Medium,
                    None,
                    "Table has no primary key defined: rows cannot be uniquely identified",
                )
                .with_fix(format!(
                    "Add a surrogate key, for example an auto-incrementing integer column:\n  \
                     ALTER TABLE {tbl} ADD COLUMN id <auto-increment integer> PRIMARY KEY;\n\
                     Or declare an existing natural key as the PRIMARY KEY."
                )),
            );
            findings.scores.push(self.config.missing_primary_key_score);
        } else {
            findings.scores.push(PRIMARY_KEY_SCORE);
        }

        if primary_keys.len() > 1 {
            let names: Vec<&str> = primary_keys.iter().map(|c| c.name.as_str()).collect();
            let quoted = names
                .iter()
                .map(|name| connector.quote_identifier(name))
                .collect::<Vec<_>>()
                .join(", ");
            if let Some(duplicates) = composite_key_duplicates(connector, &tbl, &quoted).await {
                record_composite_key(&mut findings, &names, &quoted, &tbl, duplicates);
            }
        }

        // Freshness from the first temporal column
        let temporal = {
            let classifier = connector.type_classifier();
            columns
                .iter()
                .find(|c| classifier.is_temporal(&c.data_type))
        };
        let mut table_level = TableLevelFacts {
            row_count,
            has_primary_key: !primary_keys.is_empty(),
            primary_key_columns: primary_keys.iter().map(|c| c.name.clone()).collect(),
            freshness_score: None,
            freshness_column: None,
        };
        if let Some(column) = temporal {
            let score = freshness_score(connector, table, &column.name, schema).await;
            debug!("Freshness of {}.{}: {}", table, column.name, score);
            if score < self.config.stale_freshness_threshold {
                let col = connector.quote_identifier(&column.name);
                findings.issues.push(
                    QualityIssue::new(
                        Severity::Medium,
                        Some(&column.name),
                        format!("Data may be stale: freshness score {score}/100"),
                    )
                    .with_fix(format!(
                        "Check the newest rows:\n  SELECT MAX({col}) AS latest FROM {tbl};\n\
                         Confirm the job that loads this table is still running."
                    )),
                );
            }
            findings.scores.push(score);
            table_level.freshness_score = Some(score);
            table_level.freshness_column = Some(column.name.clone());
        }

        let (overall_score, grade) = score_and_grade(mean_score(&findings.scores));
        sort_by_severity(&mut findings.issues);

        TableQualityReport {
            table_name: table.to_string(),
            schema: schema.map(str::to_string),
            analyzed_at,
            column_metrics,
            table_level,
            overall_score,
            grade,
            issues: findings.issues,
            highlights: findings.highlights,
        }
    }

    /// Analyzes several tables, reading each one's columns first.
    ///
    /// Tables whose columns cannot be listed are logged and skipped rather
    /// than aborting the batch.
    pub async fn analyze_tables<C>(
        &self,
        connector: &C,
        tables: &[String],
        schema: Option<&str>,
    ) -> Vec<TableQualityReport>
    where
        C: DatabaseConnector + ?Sized,
    {
        self.analyze_batch(connector, tables, schema).await.0
    }

    /// Analyzes every table in `schema` and aggregates the results.
    ///
    /// # Errors
    /// Returns the connector error when the table list itself cannot be read.
    pub async fn analyze_database<C>(
        &self,
        connector: &C,
        schema: Option<&str>,
    ) -> Result<DatabaseAnalysis>
    where
        C: DatabaseConnector + ?Sized,
    {
        let tables: Vec<String> = connector
            .list_tables(schema)
            .await?
            .into_iter()
            .map(|table| table.name)
            .collect();
        info!("Analyzing {} tables", tables.len());

        let (reports, skipped_tables) = self.analyze_batch(connector, &tables, schema).await;
        let overview = self.overview(&reports).map(|mut overview| {
            overview.total_tables = tables.len();
            overview
        });

        Ok(DatabaseAnalysis {
            reports,
            overview,
            skipped_tables,
        })
    }

    /// Aggregates reports using the configured top-issue limit.
    pub fn overview(&self, reports: &[TableQualityReport]) -> Option<DatabaseQualityOverview> {
        database_overview(reports, self.config.top_issue_limit)
    }

    async fn analyze_batch<C>(
        &self,
        connector: &C,
        tables: &[String],
        schema: Option<&str>,
    ) -> (Vec<TableQualityReport>, Vec<String>)
    where
        C: DatabaseConnector + ?Sized,
    {
        let mut reports = Vec::with_capacity(tables.len());
        let mut skipped = Vec::new();
        for table in tables {
            match connector.list_columns(table, schema).await {
                Ok(columns) => {
                    reports.push(self.analyze_table(connector, table, &columns, schema).await);
                }
                Err(e) => {
                    warn!("Quality analysis skipped table '{}': {}", table, e);
                    skipped.push(table.clone());
                }
            }
        }
        (reports, skipped)
    }

    /// Scores one column and records its issues and highlights.
    fn evaluate_column(
        &self,
        column: &ColumnMetadata,
        stats: ColumnStats,
        single_primary_key: bool,
        tbl: &str,
        col: &str,
        findings: &mut Findings,
    ) -> ColumnQualityMetrics {
        let name = column.name.as_str();

        // Unknown completeness (failed statistics) scores as complete.
        let completeness = stats.completeness_pct.unwrap_or(100.0);
        if let Some(pct) = stats.completeness_pct {
            let nulls = stats.null_count.unwrap_or(0);
            let total = stats.total_rows.unwrap_or(0);
            if pct < self.config.completeness_high_threshold && !column.is_nullable {
                findings.issues.push(
                    QualityIssue::new(
                        Severity::High,
                        Some(name),
                        format!(
                            "Only {pct:.0}% complete but marked NOT NULL: {nulls} unexpected NULLs"
                        ),
                    )
                    .with_fix(format!(
                        "Inspect the rows missing a value:\n  \
                         SELECT * FROM {tbl} WHERE {col} IS NULL LIMIT 50;\n\
                         Backfill them from the source system, or relax the NOT NULL \
                         constraint if the values are legitimately unknown."
                    )),
                );
            } else if pct >= self.config.completeness_high_threshold
                && pct < self.config.completeness_medium_threshold
            {
                findings.issues.push(
                    QualityIssue::new(
                        Severity::Medium,
                        Some(name),
                        format!("Low completeness: {pct}% ({nulls} NULL rows out of {total})"),
                    )
                    .with_fix(format!(
                        "Review the rows missing a value:\n  \
                         SELECT * FROM {tbl} WHERE {col} IS NULL LIMIT 50;\n\
                         If NULLs are expected, document {name} as an optional field."
                    )),
                );
            } else if pct >= 100.0 && !column.is_nullable {
                findings.highlights.push(format!("{name}: 100% complete"));
            }
        }
        findings.scores.push(completeness);

        let mut uniqueness_label = None;
        if let Some(uniqueness) = stats.uniqueness_pct {
            if column.is_primary_key && single_primary_key && uniqueness < 100.0 {
                let duplicates = stats
                    .total_rows
                    .unwrap_or(0)
                    .saturating_sub(stats.distinct_count.unwrap_or(0));
                findings.issues.push(
                    QualityIssue::new(
                        Severity::Critical,
                        Some(name),
                        format!(
                            "PRIMARY KEY has duplicate values: {duplicates} duplicate rows \
                             (uniqueness {uniqueness:.1}%)"
                        ),
                    )
                    .with_fix(format!(
                        "Find the duplicated keys:\n  \
                         SELECT {col}, COUNT(*) AS copies FROM {tbl} GROUP BY {col} HAVING COUNT(*) > 1;\n\
                         Keep one row per key, delete the others, then restore the \
                         PRIMARY KEY constraint."
                    )),
                );
            } else if uniqueness >= 100.0 && stats.distinct_count.unwrap_or(0) > 1 {
                uniqueness_label = Some(UniquenessLabel::FullyUnique);
            } else if uniqueness < self.config.low_cardinality_threshold {
                uniqueness_label = Some(UniquenessLabel::LowCardinality);
            }
        }

        let mut range_summary = None;
        if let (Some(min), Some(max), Some(avg)) = (stats.min, stats.max, stats.avg) {
            if min < 0.0 && max > 0.0 && name.to_lowercase().contains("price") {
                findings.issues.push(
                    QualityIssue::new(
                        Severity::High,
                        Some(name),
                        format!("Negative values found in price column (min={min})"),
                    )
                    .with_fix(format!(
                        "Inspect the negative rows:\n  \
                         SELECT * FROM {tbl} WHERE {col} < 0 LIMIT 50;\n\
                         Move refunds or credits to a separate table, or enforce \
                         CHECK ({col} >= 0)."
                    )),
                );
            }
            range_summary = Some(format!(
                "{} to {} (avg: {})",
                format_amount(min),
                format_amount(max),
                format_amount(avg)
            ));
        }

        ColumnQualityMetrics {
            column_name: column.name.clone(),
            data_type: column.data_type.clone(),
            is_primary_key: column.is_primary_key,
            is_nullable: column.is_nullable,
            uniqueness_score: stats.uniqueness_pct,
            stats,
            completeness_score: completeness,
            uniqueness_label,
            range_summary,
        }
    }
}

/// Number of primary-key combinations occurring more than once, `None`
/// when the check could not run.
async fn composite_key_duplicates<C>(connector: &C, tbl: &str, quoted: &str) -> Option<u64>
where
    C: DatabaseConnector + ?Sized,
{
    let sql = format!(
        "SELECT COUNT(*) AS c FROM (SELECT {quoted} FROM {tbl} GROUP BY {quoted} \
         HAVING COUNT(*) > 1) AS dup"
    );
    match connector.execute(&sql, &[]).await {
        Ok(rows) => Some(rows.first().and_then(|row| row.get_u64("c")).unwrap_or(0)),
        Err(e) => {
            warn!("Composite key check on {} failed: {}", tbl, e);
            None
        }
    }
}

fn record_composite_key(
    findings: &mut Findings,
    names: &[&str],
    quoted: &str,
    tbl: &str,
    duplicates: u64,
) {
    let listed = names.join(", ");
    if duplicates > 0 {
        findings.issues.push(
            QualityIssue::new(
                Severity::Critical,
                None,
                format!(
                    "Composite PRIMARY KEY ({listed}) has {duplicates} duplicate combinations"
                ),
            )
            .with_fix(format!(
                "Locate the repeated key combinations:\n  \
                 SELECT {quoted}, COUNT(*) AS copies FROM {tbl} GROUP BY {quoted} HAVING COUNT(*) > 1;\n\
                 Deduplicate keeping one row per combination."
            )),
        );
    } else {
        findings
            .highlights
            .push(format!("Composite primary key ({listed}) is unique"));
    }
}
