//! Root-cause confidence scoring
//!
//! confidence = sample_adequacy × (base + (1 - base) × exceedance_strength)
//!
//! - `exceedance_strength = e / (1 + e)` for relative exceedance `e >= 0`,
//!   so a detector that barely clears its threshold still scores `base`
//! - `sample_adequacy = min(1, n / floor)`, monotonically increasing in `n`

use crate::config::RootCauseConfig;
use crate::types::ConfidenceBreakdown;

/// Score a flagged signal. Returns the confidence in [0, 1] and its parts.
pub fn score_confidence(
    exceedance: f64,
    sample_size: usize,
    config: &RootCauseConfig,
) -> (f64, ConfidenceBreakdown) {
    let breakdown = ConfidenceBreakdown {
        exceedance: exceedance_strength(exceedance),
        sample_adequacy: sample_adequacy(sample_size, config.sample_adequacy_floor),
    };
    let base = config.confidence_base_weight.clamp(0.0, 1.0);
    let confidence =
        breakdown.sample_adequacy * (base + (1.0 - base) * breakdown.exceedance);
    (confidence.clamp(0.0, 1.0), breakdown)
}

/// e / (1 + e), 0 for negative or non-finite input.
fn exceedance_strength(e: f64) -> f64 {
    if e.is_finite() && e > 0.0 {
        e / (1.0 + e)
    } else if e == f64::INFINITY {
        1.0
    } else {
        0.0
    }
}

fn sample_adequacy(n: usize, floor: usize) -> f64 {
    if floor == 0 {
        return 1.0;
    }
    (n as f64 / floor as f64).min(1.0)
}
