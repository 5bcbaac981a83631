//! Quality analysis configuration.
//!
//! Every threshold that decides whether a finding is raised, plus the score
//! a table gets when it has no primary key.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Thresholds used by the quality analyzer. All percentages are 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// NOT NULL columns below this completeness raise a high issue
    pub completeness_high_threshold: f64,
    /// Columns below this completeness (and at or above the high threshold)
    /// raise a medium issue
    pub completeness_medium_threshold: f64,
    /// Uniqueness below this is labelled low cardinality
    pub low_cardinality_threshold: f64,
    /// Freshness scores below this raise a staleness issue
    pub stale_freshness_threshold: f64,
    /// Score contributed by a table without a primary key
    pub missing_primary_key_score: f64,
    /// Number of critical/high issues kept in the database overview
    pub top_issue_limit: usize,
}

/// Validation errors for quality configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    /// A threshold lies outside 0..=100
    #[error("{field} must be between 0 and 100, got {value}")]
    OutOfRange {
        /// Offending field
        field: &'static str,
        /// Value it held
        value: f64,
    },
    /// The high-severity completeness bound exceeds the medium one
    #[error(
        "completeness_high_threshold ({high}) must not exceed completeness_medium_threshold ({medium})"
    )]
    InvertedCompletenessBounds {
        /// `completeness_high_threshold`
        high: f64,
        /// `completeness_medium_threshold`
        medium: f64,
    },
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            completeness_high_threshold: 50.0,
            completeness_medium_threshold: 80.0,
            low_cardinality_threshold: 5.0,
            stale_freshness_threshold: 50.0,
            missing_primary_key_score: 70.0,
            top_issue_limit: 5,
        }
    }
}

fn clamp_percentage(field: &str, value: f64) -> f64 {
    if !(0.0..=100.0).contains(&value) {
        tracing::warn!("{} {} clamped to valid range [0, 100]", field, value);
    }
    value.clamp(0.0, 100.0)
}

impl QualityConfig {
    /// Creates a new quality config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the high-severity completeness bound.
    pub fn with_completeness_high_threshold(mut self, threshold: f64) -> Self {
        self.completeness_high_threshold =
            clamp_percentage("completeness_high_threshold", threshold);
        self
    }

    /// Builder method to set the medium-severity completeness bound.
    pub fn with_completeness_medium_threshold(mut self, threshold: f64) -> Self {
        self.completeness_medium_threshold =
            clamp_percentage("completeness_medium_threshold", threshold);
        self
    }

    /// Builder method to set the low-cardinality bound.
    pub fn with_low_cardinality_threshold(mut self, threshold: f64) -> Self {
        self.low_cardinality_threshold = clamp_percentage("low_cardinality_threshold", threshold);
        self
    }

    /// Builder method to set the staleness bound.
    pub fn with_stale_freshness_threshold(mut self, threshold: f64) -> Self {
        self.stale_freshness_threshold = clamp_percentage("stale_freshness_threshold", threshold);
        self
    }

    /// Builder method to set the missing-primary-key score.
    pub fn with_missing_primary_key_score(mut self, score: f64) -> Self {
        self.missing_primary_key_score = clamp_percentage("missing_primary_key_score", score);
        self
    }

    /// Builder method to set how many issues the overview keeps.
    pub fn with_top_issue_limit(mut self, limit: usize) -> Self {
        self.top_issue_limit = limit;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error if any percentage is outside 0-100 or the
    /// completeness bounds are inverted.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let percentages = [
            ("completeness_high_threshold", self.completeness_high_threshold),
            (
                "completeness_medium_threshold",
                self.completeness_medium_threshold,
            ),
            ("low_cardinality_threshold", self.low_cardinality_threshold),
            ("stale_freshness_threshold", self.stale_freshness_threshold),
            ("missing_primary_key_score", self.missing_primary_key_score),
        ];
        for (field, value) in percentages {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigValidationError::OutOfRange { field, value });
            }
        }
        if self.completeness_high_threshold > self.completeness_medium_threshold {
            return Err(ConfigValidationError::InvertedCompletenessBounds {
                high: self.completeness_high_threshold,
                medium: self.completeness_medium_threshold,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QualityConfig::default();
        assert_eq!(config.completeness_high_threshold, 50.0);
        assert_eq!(config.completeness_medium_threshold, 80.0);
        assert_eq!(config.low_cardinality_threshold, 5.0);
        assert_eq!(config.stale_freshness_threshold, 50.0);
        assert_eq!(config.missing_primary_key_score, 70.0);
        assert_eq!(config.top_issue_limit, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders_clamp() {
        let config = QualityConfig::new()
            .with_completeness_high_threshold(-5.0)
            .with_completeness_medium_threshold(150.0)
            .with_top_issue_limit(10);
        assert_eq!(config.completeness_high_threshold, 0.0);
        assert_eq!(config.completeness_medium_threshold, 100.0);
        assert_eq!(config.top_issue_limit, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = QualityConfig {
            stale_freshness_threshold: 120.0,
            ..QualityConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::OutOfRange {
                field: "stale_freshness_threshold",
                value: 120.0
            })
        );
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let config = QualityConfig::new()
            .with_completeness_high_threshold(90.0)
            .with_completeness_medium_threshold(60.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvertedCompletenessBounds { .. })
        ));
    }
}
