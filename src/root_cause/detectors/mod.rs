//! Signal detectors for root-cause analysis
//!
//! Each detector looks at the issue records from one angle and reports a
//! flagged signal with the relative exceedance of its threshold. The engine
//! turns signals into scored `RootCause`s.
//!
//! ## Detectors
//!
//! 1. **Temporal** - peak hour of day and dominant shift
//! 2. **Equipment** - issue rate per machine against its record volume
//! 3. **Operator** - issue rate per operator against its record volume
//! 4. **Environmental** - environmental readings correlated with issues

pub mod temporal;
pub mod equipment;
pub mod operator;
pub mod environmental;

pub use temporal::TemporalDetector;
pub use equipment::EquipmentDetector;
pub use operator::OperatorDetector;
pub use environmental::EnvironmentalDetector;

use std::collections::HashMap;

use crate::config::{RootCauseConfig, SchemaConfig};
use crate::types::{CauseFamily, Dataset, Finding};

/// Everything a detector may read.
pub struct DetectionContext<'a> {
    /// Rows left after field and date filters
    pub scope: &'a Dataset,
    /// Subset of `scope` matching the issue type (all of `scope` when none given)
    pub issues: &'a Dataset,
    pub issue_type: Option<&'a str>,
    /// Resolved timestamp column, if the dataset has one
    pub timestamp_column: Option<&'a str>,
    pub schema: &'a SchemaConfig,
    pub config: &'a RootCauseConfig,
}

/// A flagged detector result.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// Dominant finding first
    pub findings: Vec<Finding>,
    /// Relative exceedance of the flagging threshold (>= 0)
    pub exceedance: f64,
    pub sample_size: usize,
}

/// Trait for root-cause signal detectors
pub trait SignalDetector: Send + Sync {
    /// Detector name (e.g., "Temporal", "Equipment")
    fn name(&self) -> &str;

    fn family(&self) -> CauseFamily;

    /// `None` when nothing crosses the detector's threshold
    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<Signal>;
}

/// Create the default set of 4 detectors
pub fn default_detectors() -> Vec<Box<dyn SignalDetector>> {
    vec![
        Box::new(TemporalDetector),
        Box::new(EquipmentDetector),
        Box::new(OperatorDetector),
        Box::new(EnvironmentalDetector),
    ]
}

/// Record count per label, sorted by descending count then label.
pub(crate) fn label_counts(dataset: &Dataset, column: &str) -> Option<Vec<(String, usize)>> {
    let labels = dataset.labels(column)?;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels.into_iter().flatten() {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Some(counts)
}

/// `value / threshold - 1`, 0 when the threshold is not positive.
pub(crate) fn relative_exceedance(value: f64, threshold: f64) -> f64 {
    if threshold > 0.0 {
        (value / threshold - 1.0).max(0.0)
    } else {
        0.0
    }
}

/// Issue rate of one label: issue weight over its record volume in scope.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LabelRate {
    pub label: String,
    /// Issue records, or summed defects when no issue type is given
    pub issues: f64,
    /// Records carrying this label in scope
    pub volume: usize,
    pub rate: f64,
}

/// A label whose issue rate crossed `ratio` × the baseline rate.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RateConcentration {
    pub top: LabelRate,
    /// Issue rate across all eligible labels
    pub baseline: f64,
    pub threshold: f64,
    /// Labels compared
    pub compared: usize,
}

/// Issue weight per label. With an issue type every matching record counts
/// once; without one each scoped record counts its defect count.
fn issue_weights(ctx: &DetectionContext<'_>, column: &str) -> Option<HashMap<String, f64>> {
    let mut weights: HashMap<String, f64> = HashMap::new();
    if ctx.issue_type.is_some() {
        for (label, count) in label_counts(ctx.issues, column)? {
            weights.insert(label, count as f64);
        }
    } else {
        let labels = ctx.scope.labels(column)?;
        let defects = ctx.scope.numeric(&ctx.schema.defect_column)?;
        for (label, d) in labels.into_iter().zip(defects) {
            if let (Some(label), Some(d)) = (label, d) {
                *weights.entry(label.to_string()).or_insert(0.0) += d;
            }
        }
    }
    Some(weights)
}

/// Per-label issue rates over labels with at least `min_volume` scoped
/// records, highest rate first (ties: more issues, then label), plus the
/// baseline rate across those labels.
pub(crate) fn issue_rates(
    ctx: &DetectionContext<'_>,
    column: &str,
    min_volume: usize,
) -> Option<(Vec<LabelRate>, f64)> {
    let volumes = label_counts(ctx.scope, column)?;
    let weights = issue_weights(ctx, column)?;

    let mut rates: Vec<LabelRate> = volumes
        .into_iter()
        .filter(|(_, volume)| *volume >= min_volume.max(1))
        .map(|(label, volume)| {
            let issues = weights.get(&label).copied().unwrap_or(0.0);
            LabelRate {
                rate: issues / volume as f64,
                label,
                issues,
                volume,
            }
        })
        .collect();

    let total_volume: usize = rates.iter().map(|r| r.volume).sum();
    if total_volume == 0 {
        return None;
    }
    let baseline = rates.iter().map(|r| r.issues).sum::<f64>() / total_volume as f64;

    rates.sort_by(|a, b| {
        b.rate
            .total_cmp(&a.rate)
            .then_with(|| b.issues.total_cmp(&a.issues))
            .then_with(|| a.label.cmp(&b.label))
    });
    Some((rates, baseline))
}

/// Rate rule shared by the equipment and operator detectors: the label with
/// the highest issue rate is flagged when that rate exceeds `ratio` × the
/// baseline rate. At least two labels must be compared.
pub(crate) fn rate_concentration(
    ctx: &DetectionContext<'_>,
    column: &str,
    ratio: f64,
    min_volume: usize,
) -> Option<RateConcentration> {
    let (rates, baseline) = issue_rates(ctx, column, min_volume)?;
    if rates.len() < 2 || baseline <= 0.0 {
        return None;
    }
    let threshold = ratio * baseline;
    let compared = rates.len();
    let top = rates.into_iter().next()?;
    (top.rate > threshold).then_some(RateConcentration {
        top,
        baseline,
        threshold,
        compared,
    })
}
