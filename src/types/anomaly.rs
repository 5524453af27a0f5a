//! Anomaly detection outputs.

use serde::{Deserialize, Serialize};

use super::RowSnapshot;

/// A scored row.
///
/// Score convention (system-wide): isolation-forest `score_samples`, in
/// [-1, 0). Lower (more negative) means more anomalous.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyRecord {
    pub index: usize,
    pub anomaly_score: f64,
    /// Score is below the model's decision threshold
    pub is_outlier: bool,
    pub data: RowSnapshot,
}

/// Top-N anomalous rows plus model summary.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyReport {
    /// Sorted by ascending score (most anomalous first), then row index
    pub anomalies: Vec<AnomalyRecord>,
    /// Rows below the decision threshold
    pub total_anomalies: usize,
    /// `total_anomalies / rows`, in [0, 1]
    pub anomaly_rate: f64,
    pub threshold: f64,
    pub contamination: f64,
    pub features: Vec<String>,
    pub rows_scored: usize,
}

/// Deviation of one feature of an anomalous row from its column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDeviation {
    pub column: String,
    pub value: f64,
    pub mean: f64,
    pub std: f64,
    pub z_score: f64,
    pub is_outlier: bool,
}

/// Per-feature explanation of a single row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyFeatures {
    pub index: usize,
    pub features: Vec<FeatureDeviation>,
}
