//! Temporal Detector - peak hour of day and dominant shift

use chrono::Timelike;

use super::{label_counts, relative_exceedance, DetectionContext, Signal, SignalDetector};
use crate::ml_engine::stats::{mean, sample_std};
use crate::types::{CauseFamily, Finding};

pub struct TemporalDetector;

impl TemporalDetector {
    /// Peak hour flagged when its count exceeds mean + σ·std of the counts
    /// over all 24 hours of the day, empty hours included.
    fn peak_hour(&self, ctx: &DetectionContext<'_>) -> Option<(Finding, f64)> {
        let stamps = ctx.issues.timestamps(ctx.timestamp_column?)?;
        let mut hourly = [0usize; 24];
        for ts in stamps.into_iter().flatten() {
            hourly[ts.hour() as usize] += 1;
        }
        if hourly.iter().all(|&c| c == 0) {
            return None;
        }
        let counts: Vec<f64> = hourly.iter().map(|&c| c as f64).collect();
        let m = mean(&counts)?;
        let sd = sample_std(&counts)?;
        let threshold = m + ctx.config.hourly_sigma * sd;

        // First maximum wins, so the earliest peak hour is reported
        let (hour, &count) = hourly
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|(_, c)| **c)?;
        if count as f64 <= threshold {
            return None;
        }

        let mut finding = Finding::new(
            format!("Issues peak at {hour:02}:00"),
            format!(
                "{count} issues between {hour:02}:00 and {hour:02}:59 vs {m:.1} per hour (threshold {threshold:.1})"
            ),
        );
        finding.issue_count = Some(count);
        Some((finding, relative_exceedance(count as f64, threshold)))
    }

    /// Three or more shifts use the σ rule; two shifts use the dominance ratio.
    fn dominant_shift(&self, ctx: &DetectionContext<'_>) -> Option<(Finding, f64)> {
        let counts = label_counts(ctx.issues, &ctx.schema.shift_column)?;
        let (top, top_count) = counts.first()?;
        let top_count = *top_count as f64;

        let (threshold, basis) = match counts.len() {
            0 | 1 => return None,
            2 => {
                let runner_up = counts[1].1 as f64;
                (
                    ctx.config.shift_dominance_ratio * runner_up,
                    format!("{} in shift {}", counts[1].1, counts[1].0),
                )
            }
            _ => {
                let values: Vec<f64> = counts.iter().map(|(_, c)| *c as f64).collect();
                let m = mean(&values)?;
                let sd = sample_std(&values)?;
                (
                    m + ctx.config.hourly_sigma * sd,
                    format!("{m:.1} per shift"),
                )
            }
        };
        if top_count <= threshold {
            return None;
        }

        let mut finding = Finding::new(
            format!("Issues concentrated in shift {top}"),
            format!("{top_count} issues in shift {top} vs {basis} (threshold {threshold:.1})"),
        );
        finding.issue_count = Some(top_count as usize);
        Some((finding, relative_exceedance(top_count, threshold)))
    }
}

impl SignalDetector for TemporalDetector {
    fn name(&self) -> &str {
        "Temporal"
    }

    fn family(&self) -> CauseFamily {
        CauseFamily::Temporal
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<Signal> {
        let flagged: Vec<(Finding, f64)> = [self.peak_hour(ctx), self.dominant_shift(ctx)]
            .into_iter()
            .flatten()
            .collect();
        if flagged.is_empty() {
            return None;
        }
        let exceedance = flagged.iter().map(|(_, e)| *e).fold(0.0, f64::max);
        Some(Signal {
            findings: flagged.into_iter().map(|(f, _)| f).collect(),
            exceedance,
            sample_size: ctx.issues.len(),
        })
    }
}
