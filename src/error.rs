//! Error taxonomy for every analytics operation.
//!
//! Hard errors only. "Nothing found" outcomes (zero variance, no paired
//! observations, empty filtered subset) are empty results, never errors.

use thiserror::Error;

use crate::types::ColumnKind;

/// Errors returned at the engine call boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Column '{column}' is {actual}, expected {expected}")]
    InvalidColumnKind {
        column: String,
        expected: ColumnKind,
        actual: ColumnKind,
    },

    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    #[error("Insufficient data: {what} (need {required}, have {available})")]
    InsufficientData {
        what: &'static str,
        required: usize,
        available: usize,
    },

    #[error("{component} analysis exceeded its {timeout_ms} ms budget")]
    AnalysisTimeout {
        component: &'static str,
        timeout_ms: u64,
    },

    #[error("No dataset loaded")]
    NoDataLoaded,

    #[error("Column '{0}' does not exist")]
    UnknownColumn(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("{component} analysis failed{}: {message}", .column.as_ref().map(|c| format!(" on column '{c}'")).unwrap_or_default())]
    AnalysisFailed {
        component: &'static str,
        column: Option<String>,
        message: String,
    },
}

impl AnalysisError {
    /// Stable machine-readable code for the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidColumnKind { .. } => "INVALID_COLUMN_KIND",
            Self::InvalidRange { .. } => "INVALID_RANGE",
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::AnalysisTimeout { .. } => "ANALYSIS_TIMEOUT",
            Self::NoDataLoaded => "NO_DATA_LOADED",
            Self::UnknownColumn(_) => "UNKNOWN_COLUMN",
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::AnalysisFailed { .. } => "ANALYSIS_FAILED",
        }
    }

    /// Message safe to hand to an end user.
    ///
    /// Internal faults collapse to the component name; everything else is a
    /// validation message about the caller's own input.
    pub fn public_message(&self) -> String {
        match self {
            Self::AnalysisFailed { component, .. } => {
                format!("{component} analysis failed due to an internal error")
            }
            other => other.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidColumnKind { .. }
                | Self::InvalidRange { .. }
                | Self::UnknownColumn(_)
                | Self::InvalidParameter { .. }
        )
    }

    pub(crate) fn failed(component: &'static str, column: Option<&str>, message: impl Into<String>) -> Self {
        Self::AnalysisFailed {
            component,
            column: column.map(str::to_string),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AnalysisError::NoDataLoaded.code(), "NO_DATA_LOADED");
        assert_eq!(
            AnalysisError::UnknownColumn("x".into()).code(),
            "UNKNOWN_COLUMN"
        );
    }

    #[test]
    fn test_failed_message_hides_internal_detail() {
        let err = AnalysisError::failed("anomaly", Some("pressure"), "NaN in standardised matrix");
        assert!(err.to_string().contains("pressure"));
        let public = err.public_message();
        assert!(!public.contains("NaN"));
        assert!(public.contains("anomaly"));
    }

    #[test]
    fn test_validation_classification() {
        assert!(AnalysisError::InvalidRange { start: "a".into(), end: "b".into() }.is_validation());
        assert!(!AnalysisError::NoDataLoaded.is_validation());
    }
}
