//! Correlation findings and strength classification.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::thresholds::strength;

/// Strength band of a correlation, a pure function of |r|.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl CorrelationStrength {
    /// Classify an absolute correlation coefficient.
    pub fn from_abs(abs_r: f64) -> Self {
        match abs_r {
            r if r >= strength::VERY_STRONG => Self::VeryStrong,
            r if r >= strength::STRONG => Self::Strong,
            r if r >= strength::MODERATE => Self::Moderate,
            _ => Self::Weak,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
            Self::VeryStrong => "very_strong",
        }
    }
}

impl fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pairwise Pearson correlation that met the requested threshold.
///
/// `variable1` always precedes `variable2` in schema order, so a pair is
/// reported at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationFinding {
    pub variable1: String,
    pub variable2: String,
    /// Pearson correlation coefficient (-1 to 1)
    pub coefficient: f64,
    pub abs_coefficient: f64,
    /// Two-sided p-value under H0: r = 0
    pub p_value: f64,
    pub strength: CorrelationStrength,
    /// Paired non-missing observations used
    pub sample_count: usize,
}

impl CorrelationFinding {
    pub fn is_significant(&self) -> bool {
        self.p_value < super::thresholds::SIGNIFICANCE_THRESHOLD
    }
}

/// Output of a correlation scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationReport {
    /// Sorted by descending |r|
    pub correlations: Vec<CorrelationFinding>,
    pub threshold: f64,
    pub total_pairs: usize,
    /// Unordered pairs with enough paired data to compute r
    pub pairs_evaluated: usize,
    /// Numeric columns skipped because their variance is zero
    pub skipped_columns: Vec<String>,
}
