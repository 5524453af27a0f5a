//! Descriptive Statistics
//!
//! Dataset overview, per-column metadata, dashboard summary, sample rows,
//! time-bucketed aggregation and early/late window trend comparison.
//!
//! Every function is a pure read over a `Dataset` snapshot. Zero-row
//! datasets produce zero counts and empty collections.

use chrono::{Datelike, Days, NaiveDateTime, Timelike};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::config::{SchemaConfig, StatsConfig};
use crate::error::AnalysisError;
use crate::types::{
    ColumnInfo, ColumnKind, DashboardStats, Dataset, DatasetOverview, DateRange, GroupBy,
    NumericStats, NumericSummary, SampleRows, TimeBucket, TimeSeries, TimeSeriesQuery,
    TrendSummary, ValueCount,
};

// ============================================================================
// Numeric helpers
// ============================================================================

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1). `None` below two observations.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn observed(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

fn summarize(values: &[f64]) -> NumericSummary {
    NumericSummary {
        count: values.len(),
        sum: values.iter().sum(),
        mean: mean(values),
        min: values.iter().copied().reduce(f64::min),
        max: values.iter().copied().reduce(f64::max),
        std: sample_std(values),
    }
}

/// Value counts sorted by descending count, then label.
fn value_counts<'a>(labels: impl Iterator<Item = Option<&'a str>>) -> Vec<ValueCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels.flatten() {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut out: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    out
}

/// The timestamp column used for date ranges, time series and date filters.
///
/// The configured column when it exists as datetime, otherwise the first
/// datetime column in schema order.
pub(crate) fn timestamp_column<'a>(dataset: &'a Dataset, schema: &SchemaConfig) -> Option<&'a str> {
    match dataset.column(&schema.timestamp_column) {
        Some(c) if c.kind == ColumnKind::Datetime => Some(c.name.as_str()),
        _ => dataset
            .columns()
            .iter()
            .find(|c| c.kind == ColumnKind::Datetime)
            .map(|c| c.name.as_str()),
    }
}

// ============================================================================
// StatsAnalyzer
// ============================================================================

/// Descriptive statistics over a dataset snapshot.
#[derive(Debug, Clone, Default)]
pub struct StatsAnalyzer {
    schema: SchemaConfig,
    config: StatsConfig,
}

impl StatsAnalyzer {
    pub fn new(schema: SchemaConfig, config: StatsConfig) -> Self {
        Self { schema, config }
    }

    pub fn date_range(&self, dataset: &Dataset) -> Option<DateRange> {
        let column = timestamp_column(dataset, &self.schema)?;
        let stamps = dataset.timestamps(column)?;
        let mut iter = stamps.into_iter().flatten();
        let first = iter.next()?;
        let (start, end) = iter.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));
        Some(DateRange { start, end })
    }

    /// Global dataset overview.
    pub fn overview(&self, dataset: &Dataset) -> DatasetOverview {
        let numeric_columns = dataset.names_of_kind(ColumnKind::Numeric);

        let numeric_summary = numeric_columns
            .iter()
            .filter_map(|name| {
                let values = dataset.numeric(name)?;
                Some((name.clone(), summarize(&observed(&values))))
            })
            .collect();

        let missing_values = dataset
            .columns()
            .iter()
            .filter_map(|c| {
                let values = dataset.values(&c.name)?;
                Some((c.name.clone(), values.iter().filter(|v| v.is_missing()).count()))
            })
            .collect();

        DatasetOverview {
            total_records: dataset.len(),
            total_columns: dataset.columns().len(),
            date_range: self.date_range(dataset),
            columns: dataset.column_names(),
            numeric_columns,
            categorical_columns: dataset.names_of_kind(ColumnKind::Categorical),
            datetime_columns: dataset.names_of_kind(ColumnKind::Datetime),
            identifier_columns: dataset.names_of_kind(ColumnKind::Identifier),
            numeric_summary,
            missing_values,
        }
    }

    /// Metadata for every column, in schema order.
    pub fn columns_info(&self, dataset: &Dataset) -> Vec<ColumnInfo> {
        let total = dataset.len();
        dataset
            .columns()
            .iter()
            .map(|column| {
                let values = dataset.values(&column.name).unwrap_or_default();
                let null_count = values.iter().filter(|v| v.is_missing()).count();
                let null_percentage = if total == 0 {
                    0.0
                } else {
                    null_count as f64 / total as f64 * 100.0
                };

                let mut info = ColumnInfo {
                    name: column.name.clone(),
                    kind: column.kind,
                    null_count,
                    null_percentage,
                    numeric: None,
                    cardinality: None,
                    top_values: Vec::new(),
                };

                match column.kind {
                    ColumnKind::Numeric => {
                        let obs: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
                        info.numeric = numeric_stats(&obs);
                    }
                    ColumnKind::Categorical | ColumnKind::Identifier => {
                        let counts = value_counts(values.iter().map(|v| v.as_text()));
                        info.cardinality = Some(counts.len());
                        info.top_values = counts.into_iter().take(self.config.top_values).collect();
                    }
                    ColumnKind::Datetime => {}
                }
                info
            })
            .collect()
    }

    /// Dashboard summary keyed on the configured schema columns.
    pub fn dashboard(&self, dataset: &Dataset) -> DashboardStats {
        let defects = dataset
            .numeric(&self.schema.defect_column)
            .map(|v| observed(&v));
        let distribution = |name: &str| {
            dataset
                .labels(name)
                .map(|labels| value_counts(labels.into_iter()))
        };

        let numeric_stats = dataset
            .names_of_kind(ColumnKind::Numeric)
            .into_iter()
            .take(self.config.dashboard_numeric_columns)
            .filter_map(|name| {
                let values = dataset.numeric(&name)?;
                let summary = summarize(&observed(&values));
                Some((name, summary))
            })
            .collect();

        DashboardStats {
            total_records: dataset.len(),
            date_range: self.date_range(dataset),
            total_defects: defects.as_ref().map(|d| d.iter().sum()),
            avg_defects: defects.as_deref().and_then(mean),
            max_defects: defects
                .as_ref()
                .and_then(|d| d.iter().copied().reduce(f64::max)),
            ncr_distribution: distribution(&self.schema.issue_type_column),
            severity_distribution: distribution(&self.schema.severity_column),
            line_distribution: distribution(&self.schema.line_column),
            numeric_stats,
        }
    }

    /// First `limit` rows (configured default when `None`).
    pub fn sample(&self, dataset: &Dataset, limit: Option<usize>) -> SampleRows {
        let limit = limit.unwrap_or(self.config.default_sample_limit);
        let data: Vec<_> = (0..dataset.len().min(limit))
            .filter_map(|i| dataset.row(i))
            .collect();
        SampleRows {
            count: data.len(),
            data,
        }
    }

    /// Time-bucketed aggregate of a numeric column.
    ///
    /// Validation runs before any computation. Rows with a missing timestamp
    /// are excluded and counted; buckets without observed values are omitted.
    pub fn time_series(
        &self,
        dataset: &Dataset,
        query: &TimeSeriesQuery,
    ) -> Result<TimeSeries, AnalysisError> {
        let column = dataset
            .column(&query.column)
            .ok_or_else(|| AnalysisError::UnknownColumn(query.column.clone()))?;
        if column.kind != ColumnKind::Numeric {
            return Err(AnalysisError::InvalidColumnKind {
                column: column.name.clone(),
                expected: ColumnKind::Numeric,
                actual: column.kind,
            });
        }
        check_range(query.start, query.end)?;
        let ts_column = timestamp_column(dataset, &self.schema)
            .ok_or_else(|| AnalysisError::UnknownColumn(self.schema.timestamp_column.clone()))?;

        let stamps = dataset.timestamps(ts_column).unwrap_or_default();
        let values = dataset.numeric(&query.column).unwrap_or_default();

        let mut excluded_rows = 0;
        let mut buckets: BTreeMap<NaiveDateTime, Vec<f64>> = BTreeMap::new();
        for (ts, value) in stamps.iter().zip(&values) {
            let Some(ts) = ts else {
                excluded_rows += 1;
                continue;
            };
            if query.start.is_some_and(|s| *ts < s) || query.end.is_some_and(|e| *ts > e) {
                continue;
            }
            let (Some(value), Some(start)) = (value, bucket_start(*ts, query.group_by)) else {
                continue;
            };
            buckets.entry(start).or_default().push(*value);
        }

        let buckets: Vec<TimeBucket> = buckets
            .into_iter()
            .map(|(start, values)| {
                let summary = summarize(&values);
                TimeBucket {
                    period: bucket_label(start, query.group_by),
                    start,
                    count: summary.count,
                    sum: summary.sum,
                    mean: summary.mean,
                    min: summary.min,
                    max: summary.max,
                }
            })
            .collect();

        debug!(
            column = %query.column,
            group_by = %query.group_by,
            buckets = buckets.len(),
            excluded_rows,
            "Time series aggregated"
        );

        Ok(TimeSeries {
            column: query.column.clone(),
            group_by: query.group_by,
            buckets,
            excluded_rows,
        })
    }

    /// Compare the mean of the earliest `window` observed values with the
    /// latest `window`, ordered by timestamp when one exists.
    ///
    /// `Ok(None)` when the column has no observed value. With no more
    /// observations than the window the previous mean equals the recent mean.
    pub fn trend(
        &self,
        dataset: &Dataset,
        column: &str,
        window: usize,
    ) -> Result<Option<TrendSummary>, AnalysisError> {
        let kind = dataset
            .column(column)
            .ok_or_else(|| AnalysisError::UnknownColumn(column.to_string()))?
            .kind;
        if kind != ColumnKind::Numeric {
            return Err(AnalysisError::InvalidColumnKind {
                column: column.to_string(),
                expected: ColumnKind::Numeric,
                actual: kind,
            });
        }
        if window == 0 {
            return Err(AnalysisError::InvalidParameter {
                name: "window",
                reason: "must be > 0".to_string(),
            });
        }

        let values = dataset.numeric(column).unwrap_or_default();
        let ordered: Vec<f64> = match timestamp_column(dataset, &self.schema)
            .and_then(|ts| dataset.timestamps(ts))
        {
            Some(stamps) => {
                let mut rows: Vec<(NaiveDateTime, f64)> = stamps
                    .into_iter()
                    .zip(values)
                    .filter_map(|(ts, v)| Some((ts?, v?)))
                    .collect();
                rows.sort_by_key(|(ts, _)| *ts);
                rows.into_iter().map(|(_, v)| v).collect()
            }
            None => observed(&values),
        };

        let Some(recent_mean) = mean(&ordered[ordered.len().saturating_sub(window)..]) else {
            return Ok(None);
        };
        let previous_mean = if ordered.len() > window {
            mean(&ordered[..window]).unwrap_or(recent_mean)
        } else {
            recent_mean
        };

        Ok(Some(TrendSummary {
            column: column.to_string(),
            window,
            previous_mean,
            recent_mean,
            sample_count: ordered.len(),
        }))
    }
}

fn numeric_stats(values: &[f64]) -> Option<NumericStats> {
    let summary = summarize(values);
    Some(NumericStats {
        min: summary.min?,
        max: summary.max?,
        mean: summary.mean?,
        std: summary.std.unwrap_or(0.0),
        median: median(values)?,
    })
}

pub(crate) fn check_range(
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Result<(), AnalysisError> {
    match (start, end) {
        (Some(s), Some(e)) if s > e => Err(AnalysisError::InvalidRange {
            start: s.to_string(),
            end: e.to_string(),
        }),
        _ => Ok(()),
    }
}

fn bucket_start(ts: NaiveDateTime, group_by: GroupBy) -> Option<NaiveDateTime> {
    let date = ts.date();
    match group_by {
        GroupBy::Hour => date.and_hms_opt(ts.hour(), 0, 0),
        GroupBy::Day => date.and_hms_opt(0, 0, 0),
        GroupBy::Week => date
            .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))?
            .and_hms_opt(0, 0, 0),
    }
}

fn bucket_label(start: NaiveDateTime, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::Hour => start.format("%Y-%m-%d %H:00:00").to_string(),
        GroupBy::Day => start.format("%Y-%m-%d").to_string(),
        GroupBy::Week => {
            let first = start.date();
            let last = first.checked_add_days(Days::new(6)).unwrap_or(first);
            format!("{}/{}", first.format("%Y-%m-%d"), last.format("%Y-%m-%d"))
        }
    }
}
