//! Root-cause hypotheses and the record filter that scopes them.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Pattern family a root cause belongs to. Drives action template lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CauseFamily {
    Temporal,
    Equipment,
    Operator,
    Environmental,
}

impl CauseFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temporal => "temporal",
            Self::Equipment => "equipment",
            Self::Operator => "operator",
            Self::Environmental => "environmental",
        }
    }

    /// Human-readable description used as the root cause title.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Temporal => "Time Pattern Analysis",
            Self::Equipment => "Equipment Correlation Analysis",
            Self::Operator => "Operator Correlation Analysis",
            Self::Environmental => "Environmental Factors Analysis",
        }
    }
}

impl fmt::Display for CauseFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One piece of statistical evidence behind a root cause.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Finding {
    pub pattern: String,
    pub evidence: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub equipment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub operator: Option<String>,
    /// Environmental column the finding is about
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub factor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub issue_count: Option<usize>,
}

impl Finding {
    pub fn new(pattern: impl Into<String>, evidence: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            evidence: evidence.into(),
            ..Default::default()
        }
    }
}

/// The two sub-scores a root-cause confidence is built from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    /// How far the flagged metric exceeds its threshold, squashed to [0, 1)
    pub exceedance: f64,
    /// Sample size relative to the adequacy floor, in [0, 1]
    pub sample_adequacy: f64,
}

/// A ranked hypothesis explaining a cluster of defects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCause {
    pub family: CauseFamily,
    pub description: String,
    /// 0 to 1
    pub confidence: f64,
    pub findings: Vec<Finding>,
    pub sample_size: usize,
    pub breakdown: ConfidenceBreakdown,
}

impl RootCause {
    /// Finding the action templates key on.
    pub fn dominant_finding(&self) -> Option<&Finding> {
        self.findings.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootCauseReport {
    /// Sorted by non-increasing confidence
    pub root_causes: Vec<RootCause>,
    pub total_issues: usize,
    pub root_cause_count: usize,
    pub analysis_date: DateTime<Utc>,
}

/// Row restriction applied before root-cause and insight analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    /// Match against the issue-type column
    pub issue_type: Option<String>,
    /// Column name -> required value
    pub fields: BTreeMap<String, String>,
    /// Inclusive lower bound on the timestamp column
    pub start: Option<NaiveDateTime>,
    /// Inclusive upper bound on the timestamp column
    pub end: Option<NaiveDateTime>,
}

impl RecordFilter {
    pub fn issue_type(issue_type: impl Into<String>) -> Self {
        Self {
            issue_type: Some(issue_type.into()),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    /// No restriction of any kind.
    pub fn is_unrestricted(&self) -> bool {
        self.issue_type.is_none() && self.fields.is_empty() && self.start.is_none() && self.end.is_none()
    }
}
