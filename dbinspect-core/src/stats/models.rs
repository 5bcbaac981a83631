//! Column statistics records.

use serde::{Deserialize, Serialize};

/// One frequent value and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopValue {
    /// Value rendered as text
    pub value: String,
    /// Rows holding the value
    pub count: u64,
}

/// Statistics for one column, computed fresh on every call.
///
/// A field is absent when the step that produces it never ran, either
/// because it does not apply to the column type or because an earlier step
/// failed. `error` holds the failure message in the latter case; the fields
/// filled before the failure are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Rows in the table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    /// Rows where the column is NULL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_count: Option<u64>,
    /// NULL share, 2 decimals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_pct: Option<f64>,
    /// Non-NULL share, 2 decimals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completeness_pct: Option<f64>,
    /// Distinct non-NULL values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_count: Option<u64>,
    /// Distinct share of non-NULL values, capped at 100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniqueness_pct: Option<f64>,
    /// Minimum, numeric columns only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum, numeric columns only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Mean, 4 decimals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    /// Sum of values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    /// Population standard deviation, 4 decimals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
    /// Most frequent values, for low-cardinality columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_values: Option<Vec<TopValue>>,
    /// Earliest value, temporal columns only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    /// Latest value, temporal columns only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    /// Failure message when a step could not run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ColumnStats {
    /// Stats holding only a failure message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Rows with a value, when both counts are known.
    pub fn non_null_count(&self) -> Option<u64> {
        Some(self.total_rows?.saturating_sub(self.null_count?))
    }
}

/// Rounds to `places` decimal places, half away from zero.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// `part / whole * 100` rounded to 2 decimals, 0 when `whole` is 0.
pub(crate) fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part as f64 / whole as f64 * 100.0, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_guards_division_by_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.345_67, 4), 2.3457);
        assert_eq!(round_to(69.04, 1), 69.0);
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let stats = ColumnStats {
            total_rows: Some(10),
            ..ColumnStats::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json, serde_json::json!({ "total_rows": 10 }));
    }

    #[test]
    fn test_non_null_count() {
        let stats = ColumnStats {
            total_rows: Some(10),
            null_count: Some(3),
            ..ColumnStats::default()
        };
        assert_eq!(stats.non_null_count(), Some(7));
        assert_eq!(ColumnStats::default().non_null_count(), None);
        assert!(ColumnStats::failed("boom").error.is_some());
    }
}
