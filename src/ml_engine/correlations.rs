//! Statistical Correlation Engine
//!
//! Pearson correlation over every unordered pair of numeric columns, with
//! p-values from the Student's t-distribution (statrs) and strength bands
//! from `types::thresholds::strength`.
//!
//! ## Key Features
//! - Pairwise deletion: each pair uses only rows where both values are present
//! - Zero-variance columns are skipped for every pair and reported
//! - Pairs are evaluated on the rayon pool, output order is deterministic

use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::{debug, info};

use crate::config::CorrelationConfig;
use crate::error::AnalysisError;
use crate::types::{ColumnKind, CorrelationFinding, CorrelationReport, CorrelationStrength, Dataset};

/// Correlation analysis engine with statistical significance testing
#[derive(Debug, Clone, Default)]
pub struct CorrelationEngine {
    config: CorrelationConfig,
}

enum PairOutcome {
    Skipped,
    BelowThreshold,
    Found(CorrelationFinding),
}

impl CorrelationEngine {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    /// Find every numeric column pair with |r| >= `threshold`.
    ///
    /// `threshold` defaults to the configured value and must lie in [0, 1].
    /// Findings are sorted by descending |r|; ties keep schema pair order.
    pub fn analyze(
        &self,
        dataset: &Dataset,
        threshold: Option<f64>,
    ) -> Result<CorrelationReport, AnalysisError> {
        let threshold = threshold.unwrap_or(self.config.default_threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AnalysisError::InvalidParameter {
                name: "threshold",
                reason: format!("must be within [0, 1], got {threshold}"),
            });
        }

        let numeric = dataset.names_of_kind(ColumnKind::Numeric);
        let columns: Vec<(String, Vec<Option<f64>>)> = numeric
            .iter()
            .filter_map(|name| Some((name.clone(), dataset.numeric(name)?)))
            .collect();
        let total_pairs = columns.len() * columns.len().saturating_sub(1) / 2;

        let (active, skipped): (Vec<_>, Vec<_>) = columns
            .iter()
            .partition(|(_, values)| has_variance(values.iter().flatten().copied()));
        let skipped_columns: Vec<String> = skipped.into_iter().map(|(n, _)| n.clone()).collect();
        if !skipped_columns.is_empty() {
            debug!(columns = ?skipped_columns, "Skipping zero-variance columns");
        }

        let pairs: Vec<(usize, usize)> = (0..active.len())
            .flat_map(|i| (i + 1..active.len()).map(move |j| (i, j)))
            .collect();

        let outcomes: Vec<PairOutcome> = pairs
            .par_iter()
            .map(|&(i, j)| {
                let (x_name, x) = active[i];
                let (y_name, y) = active[j];
                self.evaluate_pair(x_name, x, y_name, y, threshold)
            })
            .collect::<Result<_, _>>()?;

        let pairs_evaluated = outcomes
            .iter()
            .filter(|o| !matches!(o, PairOutcome::Skipped))
            .count();
        let mut correlations: Vec<CorrelationFinding> = outcomes
            .into_iter()
            .filter_map(|o| match o {
                PairOutcome::Found(f) => Some(f),
                _ => None,
            })
            .collect();

        // Stable sort keeps pair order among equal |r|
        correlations.sort_by(|a, b| b.abs_coefficient.total_cmp(&a.abs_coefficient));

        info!(
            numeric_columns = columns.len(),
            pairs_evaluated,
            findings = correlations.len(),
            threshold,
            "Correlation analysis complete"
        );

        Ok(CorrelationReport {
            correlations,
            threshold,
            total_pairs,
            pairs_evaluated,
            skipped_columns,
        })
    }

    fn evaluate_pair(
        &self,
        x_name: &str,
        x: &[Option<f64>],
        y_name: &str,
        y: &[Option<f64>],
        threshold: f64,
    ) -> Result<PairOutcome, AnalysisError> {
        let (xs, ys): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(y)
            .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
            .unzip();

        let n = xs.len();
        if n < self.config.min_paired_observations {
            debug!(x = x_name, y = y_name, paired = n, "Too few paired observations");
            return Ok(PairOutcome::Skipped);
        }

        let Some(r) = Self::pearson(&xs, &ys) else {
            debug!(x = x_name, y = y_name, "Paired subset has zero variance");
            return Ok(PairOutcome::Skipped);
        };
        if !r.is_finite() {
            return Err(AnalysisError::failed(
                "correlation",
                Some(&format!("{x_name}/{y_name}")),
                "non-finite correlation coefficient",
            ));
        }

        if r.abs() < threshold {
            return Ok(PairOutcome::BelowThreshold);
        }

        Ok(PairOutcome::Found(CorrelationFinding {
            variable1: x_name.to_string(),
            variable2: y_name.to_string(),
            coefficient: r,
            abs_coefficient: r.abs(),
            p_value: Self::p_value_for_r(r, n),
            strength: CorrelationStrength::from_abs(r.abs()),
            sample_count: n,
        }))
    }

    /// Pearson correlation coefficient.
    ///
    /// r = Σ[(xi - x̄)(yi - ȳ)] / sqrt(Σ(xi - x̄)² × Σ(yi - ȳ)²)
    ///
    /// `None` when either side has zero variance.
    pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
        let n = x.len().min(y.len());
        if n < 2 {
            return None;
        }
        let mean_x = x[..n].iter().sum::<f64>() / n as f64;
        let mean_y = y[..n].iter().sum::<f64>() / n as f64;

        let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
        for (a, b) in x[..n].iter().zip(&y[..n]) {
            let dx = a - mean_x;
            let dy = b - mean_y;
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
        }

        if sxx == 0.0 || syy == 0.0 {
            return None;
        }
        Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
    }

    /// Two-tailed p-value for r using statrs StudentsT
    ///
    /// t = r × sqrt(n-2) / sqrt(1-r²), with n-2 degrees of freedom
    pub fn p_value_for_r(r: f64, n: usize) -> f64 {
        if n < 3 {
            return 1.0;
        }

        // Perfect or near-perfect correlation is highly significant
        if r.abs() >= 0.9999 {
            return 0.0;
        }

        let df = (n - 2) as f64;
        let t_stat = r * df.sqrt() / (1.0 - r * r).sqrt();

        match StudentsT::new(0.0, 1.0, df) {
            Ok(t_dist) => (2.0 * (1.0 - t_dist.cdf(t_stat.abs()))).clamp(0.0, 1.0),
            Err(_) => 1.0,
        }
    }
}

fn has_variance(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.any(|v| v != first),
        None => false,
    }
}
