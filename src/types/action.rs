//! Corrective actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{thresholds::priority, RootCause};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Priority from root-cause confidence.
    pub fn from_confidence(confidence: f64) -> Self {
        match confidence {
            c if c >= priority::HIGH => Self::High,
            c if c >= priority::MEDIUM => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recommended corrective action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub action: String,
    pub description: String,
    pub priority: Priority,
    /// Ordered implementation steps
    pub steps: Vec<String>,
    pub estimated_impact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlan {
    pub actions: Vec<Action>,
    pub root_cause: RootCause,
    pub issue_type: Option<String>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_bands() {
        assert_eq!(Priority::from_confidence(1.0), Priority::High);
        assert_eq!(Priority::from_confidence(0.7), Priority::High);
        assert_eq!(Priority::from_confidence(0.69), Priority::Medium);
        assert_eq!(Priority::from_confidence(0.4), Priority::Medium);
        assert_eq!(Priority::from_confidence(0.39), Priority::Low);
        assert_eq!(Priority::from_confidence(0.0), Priority::Low);
    }
}
