//! Declared-type classification.
//!
//! Backends name their types differently (`NUMBER(38,0)`, `int8`,
//! `TIMESTAMP_NTZ`), so the statistics engine only asks whether a declared
//! type is numeric or temporal. The default answer comes from substring
//! vocabularies; exact per-type overrides win over the heuristic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Substrings that mark a declared type as numeric.
pub const NUMERIC_TYPE_HINTS: &[&str] = &[
    "int", "real", "float", "double", "decimal", "numeric", "number", "money", "fixed", "bigint",
    "smallint", "tinyint", "byteint",
];

/// Substrings that mark a declared type as temporal.
pub const TEMPORAL_TYPE_HINTS: &[&str] = &["date", "time", "datetime", "timestamp"];

/// Coarse category of a declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCategory {
    /// Integers, decimals and floats
    Numeric,
    /// Dates, times and timestamps
    Temporal,
    /// Anything else
    Other,
}

/// Decides which optional statistics apply to a declared type.
pub trait TypeClassifier: Send + Sync {
    /// True when MIN/MAX/AVG/SUM make sense for the type.
    fn is_numeric(&self, data_type: &str) -> bool;

    /// True when the type holds dates or timestamps.
    fn is_temporal(&self, data_type: &str) -> bool;

    /// Single category for the type. Temporal wins when both match.
    fn category(&self, data_type: &str) -> TypeCategory {
        if self.is_temporal(data_type) {
            TypeCategory::Temporal
        } else if self.is_numeric(data_type) {
            TypeCategory::Numeric
        } else {
            TypeCategory::Other
        }
    }
}

/// Substring-vocabulary classifier with exact, case-insensitive overrides.
///
/// A type such as `timestamp_id` matches the temporal vocabulary; pin it
/// with an override when the heuristic guesses wrong.
///
/// # Example
/// ```rust
/// use dbinspect_core::stats::{HeuristicClassifier, TypeCategory, TypeClassifier};
///
/// let classifier = HeuristicClassifier::new()
///     .with_override("timestamp_id", TypeCategory::Other);
/// assert!(classifier.is_temporal("TIMESTAMP_NTZ"));
/// assert!(!classifier.is_temporal("TIMESTAMP_ID"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HeuristicClassifier {
    overrides: BTreeMap<String, TypeCategory>,
}

impl HeuristicClassifier {
    /// Classifier with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifier seeded from a configuration's override table.
    pub fn with_overrides(overrides: &BTreeMap<String, TypeCategory>) -> Self {
        Self {
            overrides: overrides
                .iter()
                .map(|(name, category)| (name.trim().to_lowercase(), *category))
                .collect(),
        }
    }

    /// Builder method to pin one declared type to a category.
    pub fn with_override(mut self, type_name: &str, category: TypeCategory) -> Self {
        self.overrides
            .insert(type_name.trim().to_lowercase(), category);
        self
    }

    fn lookup(&self, data_type: &str) -> Option<TypeCategory> {
        if self.overrides.is_empty() {
            return None;
        }
        self.overrides
            .get(&data_type.trim().to_lowercase())
            .copied()
    }
}

fn matches_any(data_type: &str, hints: &[&str]) -> bool {
    let lowered = data_type.to_lowercase();
    hints.iter().any(|hint| lowered.contains(hint))
}

impl TypeClassifier for HeuristicClassifier {
    fn is_numeric(&self, data_type: &str) -> bool {
        match self.lookup(data_type) {
            Some(category) => category == TypeCategory::Numeric,
            None => matches_any(data_type, NUMERIC_TYPE_HINTS),
        }
    }

    fn is_temporal(&self, data_type: &str) -> bool {
        match self.lookup(data_type) {
            Some(category) => category == TypeCategory::Temporal,
            None => matches_any(data_type, TEMPORAL_TYPE_HINTS),
        }
    }
}
