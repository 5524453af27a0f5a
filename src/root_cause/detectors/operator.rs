//! Operator Detector - issue rate per operator
//!
//! Same rate rule as the equipment detector. Only operators with at least
//! `min_operator_samples` records in scope are compared, so a single bad day
//! for a rarely scheduled operator is ignored.

use super::{rate_concentration, relative_exceedance, DetectionContext, Signal, SignalDetector};
use crate::types::{CauseFamily, Finding};

pub struct OperatorDetector;

impl SignalDetector for OperatorDetector {
    fn name(&self) -> &str {
        "Operator"
    }

    fn family(&self) -> CauseFamily {
        CauseFamily::Operator
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<Signal> {
        let flagged = rate_concentration(
            ctx,
            &ctx.schema.operator_column,
            ctx.config.operator_rate_threshold,
            ctx.config.min_operator_samples,
        )?;
        let top = &flagged.top;

        let mut finding = Finding::new(
            format!("Issue concentration for operator {}", top.label),
            format!(
                "{:.0} issues over {} records ({:.1}%) vs {:.1}% across {} operators with at least {} records (threshold {:.1}%)",
                top.issues,
                top.volume,
                top.rate * 100.0,
                flagged.baseline * 100.0,
                flagged.compared,
                ctx.config.min_operator_samples,
                flagged.threshold * 100.0
            ),
        );
        finding.operator = Some(top.label.clone());
        finding.issue_count = Some(top.issues.round() as usize);

        Some(Signal {
            findings: vec![finding],
            exceedance: relative_exceedance(top.rate, flagged.threshold),
            sample_size: top.volume,
        })
    }
}
