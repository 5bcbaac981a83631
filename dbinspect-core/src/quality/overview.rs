//! Database-wide aggregation of table reports.

use super::models::{
    DatabaseQualityOverview, ScoreDistribution, Severity, TableIssue, TableQualityReport,
};
use super::scoring::{mean_score, score_and_grade};

/// Default number of critical/high issues kept in an overview.
pub const DEFAULT_TOP_ISSUE_LIMIT: usize = 5;

impl ScoreDistribution {
    /// Adds one table score to its band.
    pub fn record(&mut self, score: f64) {
        if score >= 90.0 {
            self.excellent = self.excellent.saturating_add(1);
        } else if score >= 75.0 {
            self.good = self.good.saturating_add(1);
        } else if score >= 60.0 {
            self.fair = self.fair.saturating_add(1);
        } else {
            self.poor = self.poor.saturating_add(1);
        }
    }
}

impl DatabaseQualityOverview {
    /// Aggregates reports with the default top-issue limit.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_reports(reports: &[TableQualityReport]) -> Option<Self> {
        database_overview(reports, DEFAULT_TOP_ISSUE_LIMIT)
    }
}

fn tagged(reports: &[TableQualityReport], severity: Severity) -> Vec<TableIssue> {
    reports
        .iter()
        .flat_map(|report| {
            report.issues_with(severity).map(|issue| TableIssue {
                table: report.table_name.clone(),
                issue: issue.clone(),
            })
        })
        .collect()
}

/// Aggregates table reports into one overview.
///
/// Critical issues precede high ones in `top_issues`, each group in report
/// order. Ties for best or worst table go to the first report.
pub fn database_overview(
    reports: &[TableQualityReport],
    top_issue_limit: usize,
) -> Option<DatabaseQualityOverview> {
    let first = reports.first()?;

    let mut best = first;
    let mut worst = first;
    let mut distribution = ScoreDistribution::default();
    for report in reports {
        let score = report.overall_score;
        distribution.record(score);
        if score > best.overall_score {
            best = report;
        }
        if score < worst.overall_score {
            worst = report;
        }
    }

    let critical = tagged(reports, Severity::Critical);
    let high = tagged(reports, Severity::High);
    let critical_issues = critical.len();
    let high_issues = high.len();
    let top_issues = critical
        .into_iter()
        .chain(high)
        .take(top_issue_limit)
        .collect();

    let scores: Vec<f64> = reports.iter().map(|r| r.overall_score).collect();
    let (database_score, database_grade) = score_and_grade(mean_score(&scores));

    Some(DatabaseQualityOverview {
        database_score,
        database_grade,
        total_tables: reports.len(),
        tables_analyzed: reports.len(),
        critical_issues,
        high_issues,
        top_issues,
        best_table: best.table_name.clone(),
        worst_table: worst.table_name.clone(),
        score_distribution: distribution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::models::{Grade, QualityIssue, TableLevelFacts};
    use chrono::Utc;

    fn report(name: &str, score: f64, issues: Vec<QualityIssue>) -> TableQualityReport {
        TableQualityReport {
            table_name: name.to_string(),
            schema: None,
            analyzed_at: Utc::now(),
            column_metrics: Vec::new(),
            table_level: TableLevelFacts::default(),
            overall_score: score,
            grade: Grade::from_score(score),
            issues,
            highlights: Vec::new(),
        }
    }

    fn issue(severity: Severity, message: &str) -> QualityIssue {
        QualityIssue::new(severity, None, message)
    }

    #[test]
    fn test_empty_input_has_no_overview() {
        assert!(database_overview(&[], 5).is_none());
        assert!(DatabaseQualityOverview::from_reports(&[]).is_none());
    }

    #[test]
    fn test_aggregates_scores_and_bands() {
        let reports = [
            report("a", 95.0, vec![]),
            report("b", 80.0, vec![]),
            report("c", 60.0, vec![]),
            report("d", 40.0, vec![]),
        ];
        let overview = DatabaseQualityOverview::from_reports(&reports).unwrap();

        assert_eq!(overview.database_score, 68.8);
        assert_eq!(overview.database_grade, Grade::CPlus);
        assert_eq!(overview.total_tables, 4);
        assert_eq!(overview.tables_analyzed, 4);
        assert_eq!(overview.best_table, "a");
        assert_eq!(overview.worst_table, "d");
        assert_eq!(
            overview.score_distribution,
            ScoreDistribution {
                excellent: 1,
                good: 1,
                fair: 1,
                poor: 1
            }
        );
    }

    #[test]
    fn test_three_table_overview() {
        let reports = [
            report("clean", 95.0, vec![]),
            report("middling", 72.0, vec![]),
            report("broken", 40.0, vec![]),
        ];
        let overview = DatabaseQualityOverview::from_reports(&reports).unwrap();

        assert_eq!(overview.database_score, 69.0);
        assert_eq!(overview.database_grade, Grade::CPlus);
        assert_eq!(overview.best_table, "clean");
        assert_eq!(overview.worst_table, "broken");
        assert_eq!(
            overview.score_distribution,
            ScoreDistribution {
                excellent: 1,
                good: 0,
                fair: 1,
                poor: 1
            }
        );
    }

    #[test]
    fn test_database_grade_uses_unrounded_mean() {
        let reports = [
            report("a", 90.0, vec![]),
            report("b", 89.9, vec![]),
            report("c", 89.96, vec![]),
        ];
        let overview = DatabaseQualityOverview::from_reports(&reports).unwrap();
        assert_eq!(overview.database_score, 90.0);
        assert_eq!(overview.database_grade, Grade::AMinus);
    }

    #[test]
    fn test_ties_resolve_to_first_report() {
        let reports = [report("first", 85.0, vec![]), report("second", 85.0, vec![])];
        let overview = DatabaseQualityOverview::from_reports(&reports).unwrap();
        assert_eq!(overview.best_table, "first");
        assert_eq!(overview.worst_table, "first");
    }

    #[test]
    fn test_top_issues_put_critical_before_high() {
        let reports = [
            report(
                "orders",
                70.0,
                vec![
                    issue(Severity::High, "h1"),
                    issue(Severity::Medium, "ignored"),
                ],
            ),
            report(
                "users",
                50.0,
                vec![
                    issue(Severity::Critical, "c1"),
                    issue(Severity::High, "h2"),
                    issue(Severity::High, "h3"),
                    issue(Severity::High, "h4"),
                    issue(Severity::High, "h5"),
                ],
            ),
        ];
        let overview = database_overview(&reports, 5).unwrap();

        assert_eq!(overview.critical_issues, 1);
        assert_eq!(overview.high_issues, 5);
        let top: Vec<(&str, &str)> = overview
            .top_issues
            .iter()
            .map(|t| (t.table.as_str(), t.issue.message.as_str()))
            .collect();
        assert_eq!(
            top,
            [
                ("users", "c1"),
                ("orders", "h1"),
                ("users", "h2"),
                ("users", "h3"),
                ("users", "h4")
            ]
        );

        let limited = database_overview(&reports, 2).unwrap();
        assert_eq!(limited.top_issues.len(), 2);
    }
}
