//! Root-Cause Engine
//!
//! Restricts the dataset with a `RecordFilter`, runs every `SignalDetector`
//! over the remaining issue records and turns flagged signals into scored
//! `RootCause`s.
//!
//! ## Pipeline
//! 1. Validate the filter (unknown columns, inverted date range)
//! 2. Scope: rows matching the field filters and date bounds
//! 3. Issues: scoped rows matching the issue type (all of scope when none)
//! 4. Detectors: temporal, equipment, operator, environmental
//! 5. Confidence scoring, dedup by description, sort by confidence

pub mod confidence;
pub mod detectors;

pub use confidence::score_confidence;
pub use detectors::{default_detectors, DetectionContext, Signal, SignalDetector};

use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::{RootCauseConfig, SchemaConfig};
use crate::error::AnalysisError;
use crate::ml_engine::stats::{check_range, timestamp_column};
use crate::types::{Dataset, RecordFilter, RootCause, RootCauseReport};

pub struct RootCauseEngine {
    schema: SchemaConfig,
    config: RootCauseConfig,
    detectors: Vec<Box<dyn SignalDetector>>,
}

impl Default for RootCauseEngine {
    fn default() -> Self {
        Self::new(SchemaConfig::default(), RootCauseConfig::default())
    }
}

impl RootCauseEngine {
    pub fn new(schema: SchemaConfig, config: RootCauseConfig) -> Self {
        Self::with_detectors(schema, config, default_detectors())
    }

    pub fn with_detectors(
        schema: SchemaConfig,
        config: RootCauseConfig,
        detectors: Vec<Box<dyn SignalDetector>>,
    ) -> Self {
        Self {
            schema,
            config,
            detectors,
        }
    }

    /// Rows matching the field filters and date bounds (issue type ignored).
    pub fn scope(&self, dataset: &Dataset, filter: &RecordFilter) -> Result<Dataset, AnalysisError> {
        check_range(filter.start, filter.end)?;
        for column in filter.fields.keys() {
            if dataset.column(column).is_none() {
                return Err(AnalysisError::UnknownColumn(column.clone()));
            }
        }
        if filter.fields.is_empty() && filter.start.is_none() && filter.end.is_none() {
            return Ok(dataset.clone());
        }

        let stamps = if filter.start.is_some() || filter.end.is_some() {
            let column = timestamp_column(dataset, &self.schema)
                .ok_or_else(|| AnalysisError::UnknownColumn(self.schema.timestamp_column.clone()))?;
            dataset.timestamps(column)
        } else {
            None
        };

        let field_values: Vec<_> = filter
            .fields
            .iter()
            .filter_map(|(column, expected)| Some((dataset.values(column)?, expected.as_str())))
            .collect();

        let rows: Vec<usize> = (0..dataset.len())
            .filter(|&row| {
                field_values
                    .iter()
                    .all(|(values, expected)| values[row].matches_str(expected))
            })
            .filter(|&row| match &stamps {
                None => true,
                Some(stamps) => match stamps[row] {
                    None => false,
                    Some(ts) => {
                        filter.start.map_or(true, |s| ts >= s) && filter.end.map_or(true, |e| ts <= e)
                    }
                },
            })
            .collect();

        Ok(dataset.select_rows(&rows))
    }

    /// Rows of `scope` matching the issue type.
    ///
    /// Without an issue-type column nothing matches.
    pub fn issues(&self, scope: &Dataset, issue_type: Option<&str>) -> Dataset {
        let Some(issue_type) = issue_type else {
            return scope.clone();
        };
        let rows: Vec<usize> = match scope.values(&self.schema.issue_type_column) {
            Some(values) => values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.matches_str(issue_type))
                .map(|(i, _)| i)
                .collect(),
            None => Vec::new(),
        };
        scope.select_rows(&rows)
    }

    /// Apply the whole filter, issue type included.
    pub fn apply_filter(&self, dataset: &Dataset, filter: &RecordFilter) -> Result<Dataset, AnalysisError> {
        let scope = self.scope(dataset, filter)?;
        Ok(self.issues(&scope, filter.issue_type.as_deref()))
    }

    /// Generate ranked root-cause hypotheses for the filtered issue records.
    pub fn analyze(
        &self,
        dataset: &Dataset,
        filter: &RecordFilter,
    ) -> Result<RootCauseReport, AnalysisError> {
        let scope = self.scope(dataset, filter)?;
        let issue_type = filter.issue_type.as_deref();
        let issues = self.issues(&scope, issue_type);

        let mut causes: Vec<RootCause> = Vec::new();
        if !issues.is_empty() {
            let ctx = DetectionContext {
                scope: &scope,
                issues: &issues,
                issue_type,
                timestamp_column: timestamp_column(&scope, &self.schema),
                schema: &self.schema,
                config: &self.config,
            };

            for detector in &self.detectors {
                match detector.detect(&ctx) {
                    Some(signal) => {
                        let (confidence, breakdown) =
                            score_confidence(signal.exceedance, signal.sample_size, &self.config);
                        debug!(
                            detector = detector.name(),
                            confidence,
                            findings = signal.findings.len(),
                            "Detector flagged a signal"
                        );
                        causes.push(RootCause {
                            family: detector.family(),
                            description: detector.family().description().to_string(),
                            confidence,
                            findings: signal.findings,
                            sample_size: signal.sample_size,
                            breakdown,
                        });
                    }
                    None => debug!(detector = detector.name(), "No signal"),
                }
            }
        }

        let root_causes = dedup_and_rank(causes);
        info!(
            total_issues = issues.len(),
            root_causes = root_causes.len(),
            issue_type = issue_type.unwrap_or("*"),
            "Root cause analysis complete"
        );

        Ok(RootCauseReport {
            root_cause_count: root_causes.len(),
            root_causes,
            total_issues: issues.len(),
            analysis_date: Utc::now(),
        })
    }
}

/// Keep the highest-confidence cause per description, then sort by
/// non-increasing confidence (first-seen order on ties).
fn dedup_and_rank(causes: Vec<RootCause>) -> Vec<RootCause> {
    let mut best: Vec<RootCause> = Vec::with_capacity(causes.len());
    let mut seen: HashMap<String, usize> = HashMap::new();
    for cause in causes {
        match seen.get(&cause.description) {
            Some(&i) => {
                if cause.confidence > best[i].confidence {
                    best[i] = cause;
                }
            }
            None => {
                seen.insert(cause.description.clone(), best.len());
                best.push(cause);
            }
        }
    }
    best.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    best
}
