//! Anomaly Engine
//!
//! Builds a standardised feature matrix from the numeric columns, fits the
//! isolation forest and reports the most anomalous rows.
//!
//! Feature preparation: columns with no observed value are dropped, missing
//! cells take the column mean, then each column is centred and scaled by its
//! population std (a zero std scales by 1).

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::isolation_forest::{FitInterrupted, ForestParams, IsolationForest};
use crate::config::AnomalyConfig;
use crate::error::AnalysisError;
use crate::types::{
    thresholds::FEATURE_OUTLIER_Z, AnomalyFeatures, AnomalyRecord, AnomalyReport, ColumnKind,
    Dataset, FeatureDeviation,
};

const COMPONENT: &str = "anomaly";

/// Standardised numeric feature matrix.
struct FeatureMatrix {
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct AnomalyEngine {
    config: AnomalyConfig,
}

impl AnomalyEngine {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    pub fn fit_timeout(&self) -> Duration {
        Duration::from_millis(self.config.fit_timeout_ms)
    }

    /// Score every row and return the top `limit` most anomalous.
    ///
    /// The fit stops early with `AnalysisTimeout` when `cancel` fires or the
    /// configured fit deadline passes.
    pub fn detect(
        &self,
        dataset: &Dataset,
        limit: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<AnomalyReport, AnalysisError> {
        let limit = limit.unwrap_or(self.config.default_limit);
        if limit == 0 {
            return Err(AnalysisError::InvalidParameter {
                name: "limit",
                reason: "must be > 0".to_string(),
            });
        }

        let started = Instant::now();
        let deadline = started + self.fit_timeout();
        let matrix = self.feature_matrix(dataset)?;

        let params = ForestParams {
            n_trees: self.config.n_trees,
            max_samples: self.config.max_samples,
            seed: self.config.seed,
        };
        let forest = IsolationForest::fit(&matrix.rows, params, cancel, Some(deadline))
            .map_err(|e: FitInterrupted| {
                debug!(reason = %e, "Isolation forest fit interrupted");
                AnalysisError::AnalysisTimeout {
                    component: COMPONENT,
                    timeout_ms: self.config.fit_timeout_ms,
                }
            })?;

        let scores = forest.score_samples(&matrix.rows);
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(AnalysisError::failed(COMPONENT, None, "non-finite anomaly score"));
        }

        let threshold = percentile(&scores, self.config.contamination * 100.0)
            .ok_or_else(|| AnalysisError::failed(COMPONENT, None, "empty score vector"))?;
        let total_anomalies = scores.iter().filter(|&&s| s < threshold).count();
        let anomaly_rate = total_anomalies as f64 / scores.len() as f64;

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]).then(a.cmp(&b)));

        let anomalies: Vec<AnomalyRecord> = order
            .into_iter()
            .take(limit)
            .filter_map(|i| {
                Some(AnomalyRecord {
                    index: i,
                    anomaly_score: scores[i],
                    is_outlier: scores[i] < threshold,
                    data: dataset.row(i)?,
                })
            })
            .collect();

        info!(
            rows = scores.len(),
            features = matrix.names.len(),
            total_anomalies,
            anomaly_rate,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Anomaly detection complete"
        );

        Ok(AnomalyReport {
            anomalies,
            total_anomalies,
            anomaly_rate,
            threshold,
            contamination: self.config.contamination,
            features: matrix.names,
            rows_scored: scores.len(),
        })
    }

    /// Per-column deviation of one row from the column mean.
    ///
    /// Covers every numeric column with at least one observed value; a
    /// missing cell in the row is skipped.
    pub fn explain(&self, dataset: &Dataset, index: usize) -> Result<AnomalyFeatures, AnalysisError> {
        if index >= dataset.len() {
            return Err(AnalysisError::InvalidParameter {
                name: "index",
                reason: format!("row {index} out of range (dataset has {} rows)", dataset.len()),
            });
        }

        let features = dataset
            .names_of_kind(ColumnKind::Numeric)
            .into_iter()
            .filter_map(|column| {
                let values = dataset.numeric(&column)?;
                let value = values[index]?;
                let observed: Vec<f64> = values.iter().flatten().copied().collect();
                let (mean, std) = mean_and_population_std(&observed)?;
                let z_score = if std > 0.0 { (value - mean) / std } else { 0.0 };
                Some(FeatureDeviation {
                    column,
                    value,
                    mean,
                    std,
                    z_score,
                    is_outlier: z_score.abs() > FEATURE_OUTLIER_Z,
                })
            })
            .collect();

        Ok(AnomalyFeatures { index, features })
    }

    fn feature_matrix(&self, dataset: &Dataset) -> Result<FeatureMatrix, AnalysisError> {
        let mut names = Vec::new();
        let mut columns = Vec::new();

        for name in dataset.names_of_kind(ColumnKind::Numeric) {
            let Some(values) = dataset.numeric(&name) else {
                continue;
            };
            let observed: Vec<f64> = values.iter().flatten().copied().collect();
            let Some((mean, std)) = mean_and_population_std(&observed) else {
                debug!(column = %name, "Dropping feature with no observed values");
                continue;
            };
            let scale = if std > 0.0 { std } else { 1.0 };
            let standardised: Vec<f64> = values
                .iter()
                .map(|v| (v.unwrap_or(mean) - mean) / scale)
                .collect();
            if standardised.iter().any(|v| !v.is_finite()) {
                return Err(AnalysisError::failed(
                    COMPONENT,
                    Some(&name),
                    "non-finite value after standardisation",
                ));
            }
            names.push(name);
            columns.push(standardised);
        }

        if names.len() < self.config.min_features {
            return Err(AnalysisError::InsufficientData {
                what: "usable numeric columns",
                required: self.config.min_features,
                available: names.len(),
            });
        }
        if dataset.len() < self.config.min_rows {
            return Err(AnalysisError::InsufficientData {
                what: "rows",
                required: self.config.min_rows,
                available: dataset.len(),
            });
        }

        let rows = (0..dataset.len())
            .map(|r| columns.iter().map(|c| c[r]).collect())
            .collect();
        Ok(FeatureMatrix { names, rows })
    }
}

fn mean_and_population_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, var.sqrt()))
}

/// Percentile with linear interpolation between closest ranks.
fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
