//! Ranked insights.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::thresholds::severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Trend,
    Correlation,
    Anomaly,
}

/// Insight severity, derived from the 0-10 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= severity::CRITICAL => Self::Critical,
            s if s >= severity::HIGH => Self::High,
            s if s >= severity::MEDIUM => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Human-readable, scored summary of a detected signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub severity: Severity,
    /// 0 to 10
    pub score: f64,
}

impl Insight {
    /// Build an insight; the score is clamped to [0, 10] and severity derived
    /// from it.
    pub fn new(
        insight_type: InsightType,
        title: impl Into<String>,
        description: impl Into<String>,
        score: f64,
    ) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, severity::MAX_SCORE)
        } else {
            0.0
        };
        Self {
            title: title.into(),
            description: description.into(),
            insight_type,
            severity: Severity::from_score(score),
            score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightReport {
    pub insights: Vec<Insight>,
    pub total_insights: usize,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_score(10.0), Severity::Critical);
        assert_eq!(Severity::from_score(8.0), Severity::Critical);
        assert_eq!(Severity::from_score(7.99), Severity::High);
        assert_eq!(Severity::from_score(6.0), Severity::High);
        assert_eq!(Severity::from_score(4.0), Severity::Medium);
        assert_eq!(Severity::from_score(3.9), Severity::Low);
        assert_eq!(Severity::from_score(0.0), Severity::Low);
    }

    #[test]
    fn test_insight_score_clamped() {
        let i = Insight::new(InsightType::Anomaly, "t", "d", 14.0);
        assert_eq!(i.score, 10.0);
        assert_eq!(i.severity, Severity::Critical);

        let nan = Insight::new(InsightType::Trend, "t", "d", f64::NAN);
        assert_eq!(nan.score, 0.0);
        assert_eq!(nan.severity, Severity::Low);
    }

    #[test]
    fn test_insight_type_field_name() {
        let i = Insight::new(InsightType::Correlation, "t", "d", 5.0);
        let json = serde_json::to_value(&i).unwrap();
        assert_eq!(json["type"], "correlation");
        assert_eq!(json["severity"], "medium");
    }
}
