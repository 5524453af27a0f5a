//! Equipment Detector - issue rate per machine
//!
//! A machine's issue rate is its issue records over its records in scope, so
//! a busy machine is not flagged for volume alone.

use std::collections::HashMap;

use super::{rate_concentration, relative_exceedance, DetectionContext, Signal, SignalDetector};
use crate::types::{CauseFamily, Finding};

pub struct EquipmentDetector;

impl EquipmentDetector {
    /// Equipment with the highest mean defect count across its issue records.
    fn worst_defect_average(&self, ctx: &DetectionContext<'_>) -> Option<Finding> {
        let equipment = ctx.issues.labels(&ctx.schema.equipment_column)?;
        let defects = ctx.issues.numeric(&ctx.schema.defect_column)?;

        let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
        for (id, d) in equipment.into_iter().zip(defects) {
            if let (Some(id), Some(d)) = (id, d) {
                let entry = totals.entry(id).or_insert((0.0, 0));
                entry.0 += d;
                entry.1 += 1;
            }
        }

        let (id, avg) = totals
            .into_iter()
            .map(|(id, (sum, n))| (id, sum / n as f64))
            .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(a.0)))?;

        let mut finding = Finding::new(
            format!("Highest average defect count on {id}"),
            format!("{avg:.2} defects per issue record"),
        );
        finding.equipment = Some(id.to_string());
        Some(finding)
    }
}

impl SignalDetector for EquipmentDetector {
    fn name(&self) -> &str {
        "Equipment"
    }

    fn family(&self) -> CauseFamily {
        CauseFamily::Equipment
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<Signal> {
        let flagged = rate_concentration(
            ctx,
            &ctx.schema.equipment_column,
            ctx.config.equipment_rate_threshold,
            1,
        )?;
        let top = &flagged.top;

        let mut finding = Finding::new(
            format!("Issue concentration on equipment {}", top.label),
            format!(
                "{:.0} issues over {} records ({:.1}%) vs {:.1}% across {} machines (threshold {:.1}%)",
                top.issues,
                top.volume,
                top.rate * 100.0,
                flagged.baseline * 100.0,
                flagged.compared,
                flagged.threshold * 100.0
            ),
        );
        finding.equipment = Some(top.label.clone());
        finding.issue_count = Some(top.issues.round() as usize);

        let mut findings = vec![finding];
        findings.extend(self.worst_defect_average(ctx));

        Some(Signal {
            findings,
            exceedance: relative_exceedance(top.rate, flagged.threshold),
            sample_size: top.volume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RootCauseConfig, SchemaConfig};
    use crate::root_cause::RootCauseEngine;
    use crate::types::{Column, ColumnKind, Dataset, Value};

    /// `(machine, records, issue records, defects per issue record)`
    fn dataset(machines: &[(&str, usize, usize, f64)]) -> Dataset {
        let columns = vec![
            Column::new("machine_id", ColumnKind::Identifier),
            Column::new("ncr_type", ColumnKind::Categorical),
            Column::new("defect_count", ColumnKind::Numeric),
        ];
        let rows = machines
            .iter()
            .flat_map(|&(id, n, issues, defects)| {
                (0..n).map(move |i| {
                    let issue = i < issues;
                    vec![
                        Value::from(id),
                        Value::from(if issue { "Dimensional" } else { "Surface" }),
                        Value::from(if issue { defects } else { 0.0 }),
                    ]
                })
            })
            .collect();
        Dataset::from_rows(columns, rows).unwrap()
    }

    fn detect(scope: &Dataset) -> Option<Signal> {
        let schema = SchemaConfig::default();
        let config = RootCauseConfig::default();
        let issues = RootCauseEngine::default().issues(scope, Some("Dimensional"));
        let ctx = DetectionContext {
            scope,
            issues: &issues,
            issue_type: Some("Dimensional"),
            timestamp_column: None,
            schema: &schema,
            config: &config,
        };
        EquipmentDetector.detect(&ctx)
    }

    #[test]
    fn test_defect_prone_machine_flagged_over_busy_one() {
        let data = dataset(&[("M1", 180, 18, 1.0), ("M2", 10, 10, 9.0), ("M3", 10, 1, 2.0)]);
        let signal = detect(&data).unwrap();
        assert_eq!(signal.findings[0].equipment.as_deref(), Some("M2"));
        assert_eq!(signal.findings[0].issue_count, Some(10));
        // rate 1.0 vs threshold 1.5 × 29/200
        assert!((signal.exceedance - (1.0 / (1.5 * 0.145) - 1.0)).abs() < 1e-9);
        assert_eq!(signal.findings[1].equipment.as_deref(), Some("M2"));
        assert_eq!(signal.sample_size, 10);
    }

    #[test]
    fn test_volume_proportional_issues_not_flagged() {
        let data = dataset(&[("M1", 100, 20, 1.0), ("M2", 50, 10, 1.0), ("M3", 30, 7, 1.0)]);
        assert!(detect(&data).is_none());
    }

    #[test]
    fn test_missing_column_not_flagged() {
        let columns = vec![Column::new("defect_count", ColumnKind::Numeric)];
        let data = Dataset::from_rows(columns, vec![vec![Value::from(1.0)]]).unwrap();
        assert!(detect(&data).is_none());
    }
}
