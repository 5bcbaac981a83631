//! Score aggregation and report formatting helpers.

use super::models::{Grade, QualityIssue};
use crate::stats::round_to;

/// Unrounded mean of `scores`. An empty slice scores 100.
pub(crate) fn mean_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 100.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Displayed score (one decimal) and the grade of the unrounded mean.
pub(crate) fn score_and_grade(mean: f64) -> (f64, Grade) {
    (round_to(mean, 1), Grade::from_score(mean))
}

/// Orders issues critical first; stable within a severity.
pub(crate) fn sort_by_severity(issues: &mut [QualityIssue]) {
    issues.sort_by_key(|issue| issue.severity.rank());
}

/// Two-decimal rendering with thousands separators, e.g. `-1,234.50`.
pub(crate) fn format_amount(value: f64) -> String {
    let rendered = format!("{:.2}", value.abs());
    let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len().saturating_mul(2));
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && whole.len().saturating_sub(i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && rendered != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::Severity;

    #[test]
    fn test_mean_score() {
        assert_eq!(mean_score(&[100.0, 70.0]), 85.0);
        assert!((mean_score(&[100.0, 100.0, 65.0]) - 88.333).abs() < 0.001);
        assert_eq!(mean_score(&[]), 100.0);
    }

    #[test]
    fn test_grade_comes_from_unrounded_mean() {
        assert_eq!(score_and_grade(89.96), (90.0, Grade::AMinus));
        assert_eq!(score_and_grade(88.333), (88.3, Grade::AMinus));
        assert_eq!(score_and_grade(90.0), (90.0, Grade::A));
        assert_eq!(score_and_grade(64.96), (65.0, Grade::C));
    }

    #[test]
    fn test_sort_is_stable_within_severity() {
        let mut issues = vec![
            QualityIssue::new(Severity::Medium, Some("a"), "first medium"),
            QualityIssue::new(Severity::Critical, None, "critical"),
            QualityIssue::new(Severity::Medium, Some("b"), "second medium"),
            QualityIssue::new(Severity::High, Some("c"), "high"),
        ];
        sort_by_severity(&mut issues);
        let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(
            messages,
            ["critical", "high", "first medium", "second medium"]
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(12.5), "12.50");
        assert_eq!(format_amount(1234.5), "1,234.50");
        assert_eq!(format_amount(-1234567.891), "-1,234,567.89");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(-0.001), "0.00");
    }
}
