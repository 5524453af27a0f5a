//! Environmental Detector - environmental readings correlated with issues
//!
//! The issue indicator is 1/0 for an issue-type match when an issue type is
//! given (correlated over the whole scope), otherwise the defect count.

use tracing::debug;

use super::{relative_exceedance, DetectionContext, Signal, SignalDetector};
use crate::ml_engine::CorrelationEngine;
use crate::types::{CauseFamily, Finding};

pub struct EnvironmentalDetector;

impl EnvironmentalDetector {
    fn issue_indicator(&self, ctx: &DetectionContext<'_>) -> Option<Vec<Option<f64>>> {
        match ctx.issue_type {
            Some(issue_type) => {
                let n = ctx.scope.len();
                let indicator = match ctx.scope.values(&ctx.schema.issue_type_column) {
                    Some(values) => values
                        .iter()
                        .map(|v| Some(if v.matches_str(issue_type) { 1.0 } else { 0.0 }))
                        .collect(),
                    // No issue-type column: nothing matches
                    None => vec![Some(0.0); n],
                };
                Some(indicator)
            }
            None => ctx.scope.numeric(&ctx.schema.defect_column),
        }
    }
}

impl SignalDetector for EnvironmentalDetector {
    fn name(&self) -> &str {
        "Environmental"
    }

    fn family(&self) -> CauseFamily {
        CauseFamily::Environmental
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<Signal> {
        let indicator = self.issue_indicator(ctx)?;
        let min_r = ctx.config.environmental_correlation;

        let mut flagged: Vec<(Finding, f64, usize)> = ctx
            .schema
            .environmental_columns
            .iter()
            .filter_map(|column| {
                let readings = ctx.scope.numeric(column)?;
                let (xs, ys): (Vec<f64>, Vec<f64>) = readings
                    .iter()
                    .zip(&indicator)
                    .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                    .unzip();
                let r = CorrelationEngine::pearson(&xs, &ys)?;
                if !r.is_finite() || r.abs() < min_r {
                    debug!(column = %column, r, "Environmental factor below threshold");
                    return None;
                }

                let direction = if r > 0.0 { "rise" } else { "fall" };
                let mut finding = Finding::new(
                    format!("Issues {direction} with {column}"),
                    format!("Correlation coefficient {r:.2} over {} records", xs.len()),
                );
                finding.factor = Some(column.clone());
                Some((finding, r.abs(), xs.len()))
            })
            .collect();

        // Strongest factor first; stable on configured column order
        flagged.sort_by(|a, b| b.1.total_cmp(&a.1));
        let (_, strongest, sample_size) = flagged.first()?.clone();

        Some(Signal {
            exceedance: relative_exceedance(strongest, min_r),
            sample_size,
            findings: flagged.into_iter().map(|(f, _, _)| f).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RootCauseConfig, SchemaConfig};
    use crate::types::{Column, ColumnKind, Dataset, Value};

    fn dataset() -> Dataset {
        let columns = vec![
            Column::new("temperature", ColumnKind::Numeric),
            Column::new("vibration", ColumnKind::Numeric),
            Column::new("defect_count", ColumnKind::Numeric),
            Column::new("ncr_type", ColumnKind::Categorical),
        ];
        let rows = (0..60)
            .map(|i| {
                let hot = i % 3 == 0;
                vec![
                    Value::from(if hot { 90.0 } else { 60.0 } + (i % 5) as f64),
                    Value::from(((i * 7) % 11) as f64),
                    Value::from(if hot { 8.0 } else { 1.0 }),
                    Value::from(if hot { "Thermal" } else { "Dimensional" }),
                ]
            })
            .collect();
        Dataset::from_rows(columns, rows).unwrap()
    }

    fn detect(data: &Dataset, issue_type: Option<&str>) -> Option<Signal> {
        let schema = SchemaConfig::default();
        let config = RootCauseConfig::default();
        let issues = data.clone();
        let ctx = DetectionContext {
            scope: data,
            issues: &issues,
            issue_type,
            timestamp_column: None,
            schema: &schema,
            config: &config,
        };
        EnvironmentalDetector.detect(&ctx)
    }

    #[test]
    fn test_temperature_flagged_against_defects() {
        let signal = detect(&dataset(), None).unwrap();
        assert_eq!(signal.findings[0].factor.as_deref(), Some("temperature"));
        assert!(signal.findings.iter().all(|f| f.factor.as_deref() != Some("vibration")));
        assert_eq!(signal.sample_size, 60);
    }

    #[test]
    fn test_issue_type_indicator() {
        let signal = detect(&dataset(), Some("Thermal")).unwrap();
        assert_eq!(signal.findings[0].factor.as_deref(), Some("temperature"));
        assert!(detect(&dataset(), Some("Nonexistent")).is_none());
    }
}
