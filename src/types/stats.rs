//! Descriptive statistics outputs: overview, column metadata, time series.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::{ColumnKind, RowSnapshot};

/// Inclusive first/last timestamp observed in the timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Per-numeric-column aggregate. Mean/min/max/std are absent when the column
/// has no observed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub std: Option<f64>,
}

/// Global dataset overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub total_records: usize,
    pub total_columns: usize,
    pub date_range: Option<DateRange>,
    pub columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub datetime_columns: Vec<String>,
    pub identifier_columns: Vec<String>,
    pub numeric_summary: BTreeMap<String, NumericSummary>,
    pub missing_values: BTreeMap<String, usize>,
}

/// Distribution stats for a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    pub median: f64,
}

/// A label and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
    pub null_count: usize,
    pub null_percentage: f64,
    /// Numeric columns with at least one observed value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericStats>,
    /// Distinct non-missing labels (categorical and identifier columns)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub top_values: Vec<ValueCount>,
}

/// Summary block for the operator dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_records: usize,
    pub date_range: Option<DateRange>,
    pub total_defects: Option<f64>,
    pub avg_defects: Option<f64>,
    pub max_defects: Option<f64>,
    pub ncr_distribution: Option<Vec<ValueCount>>,
    pub severity_distribution: Option<Vec<ValueCount>>,
    pub line_distribution: Option<Vec<ValueCount>>,
    pub numeric_stats: BTreeMap<String, NumericSummary>,
}

/// First rows of a dataset.
#[derive(Debug, Clone, Serialize)]
pub struct SampleRows {
    pub data: Vec<RowSnapshot>,
    pub count: usize,
}

/// Time bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    Hour,
    Day,
    Week,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            other => Err(format!("group_by must be one of hour, day, week (got '{other}')")),
        }
    }
}

/// Time-series aggregation request.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesQuery {
    pub column: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub group_by: GroupBy,
}

impl TimeSeriesQuery {
    pub fn new(column: impl Into<String>, group_by: GroupBy) -> Self {
        Self {
            column: column.into(),
            start: None,
            end: None,
            group_by,
        }
    }
}

/// One observed time bucket. Statistics cover non-missing values only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub period: String,
    pub start: NaiveDateTime,
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Time-bucketed aggregate for a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    pub column: String,
    pub group_by: GroupBy,
    pub buckets: Vec<TimeBucket>,
    /// Rows dropped because their timestamp was missing
    pub excluded_rows: usize,
}

/// Early-window vs late-window comparison for a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub column: String,
    pub window: usize,
    pub previous_mean: f64,
    pub recent_mean: f64,
    pub sample_count: usize,
}

impl TrendSummary {
    /// Relative change of the recent window vs the previous one.
    ///
    /// `None` when the previous mean is zero (change undefined).
    pub fn relative_change(&self) -> Option<f64> {
        if self.previous_mean.abs() < f64::EPSILON {
            None
        } else {
            Some(self.recent_mean / self.previous_mean - 1.0)
        }
    }
}
