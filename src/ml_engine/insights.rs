//! Insight Ranker
//!
//! Turns trend, correlation and anomaly summaries into scored insights on a
//! 0-10 scale. Severity is derived from the score by `Insight::new`.

use crate::config::InsightConfig;
use crate::types::thresholds::SIGNIFICANCE_THRESHOLD;
use crate::types::{AnomalyReport, CorrelationFinding, Insight, InsightType, TrendSummary};

#[derive(Debug, Clone, Default)]
pub struct InsightRanker {
    config: InsightConfig,
}

impl InsightRanker {
    pub fn new(config: InsightConfig) -> Self {
        Self { config }
    }

    pub fn trend_window(&self) -> usize {
        self.config.trend_window
    }

    /// Rank all signals. Output is sorted by descending score; equal scores
    /// keep insertion order (trend, correlations, anomaly).
    pub fn rank(
        &self,
        trend: Option<&TrendSummary>,
        correlations: &[CorrelationFinding],
        anomalies: Option<&AnomalyReport>,
    ) -> Vec<Insight> {
        let mut insights = Vec::new();
        insights.extend(trend.and_then(|t| self.trend_insight(t)));
        insights.extend(
            correlations
                .iter()
                .take(self.config.max_correlation_insights)
                .map(correlation_insight),
        );
        insights.extend(anomalies.and_then(|a| self.anomaly_insight(a)));

        insights.sort_by(|a, b| b.score.total_cmp(&a.score));
        insights
    }

    fn trend_insight(&self, trend: &TrendSummary) -> Option<Insight> {
        let change = trend.relative_change()?;
        if change.abs() < self.config.trend_min_change {
            return None;
        }
        let pct = change * 100.0;
        let (title, direction) = if change > 0.0 {
            (format!("Rising {} Trend", title_case(&trend.column)), "higher")
        } else {
            (format!("Falling {} Trend", title_case(&trend.column)), "lower")
        };
        Some(Insight::new(
            InsightType::Trend,
            title,
            format!(
                "Recent {} average ({:.2}) is {:.1}% {direction} than the earliest {} records ({:.2})",
                trend.column,
                trend.recent_mean,
                pct.abs(),
                trend.window,
                trend.previous_mean
            ),
            (pct.abs() / 10.0).min(10.0),
        ))
    }

    fn anomaly_insight(&self, report: &AnomalyReport) -> Option<Insight> {
        if report.total_anomalies == 0 {
            return None;
        }
        let score = 5.0 * report.anomaly_rate / self.config.reference_anomaly_rate;
        Some(Insight::new(
            InsightType::Anomaly,
            format!("Found {} anomalous records", report.total_anomalies),
            format!(
                "{:.1}% of {} records fall below the isolation forest threshold across {} features",
                report.anomaly_rate * 100.0,
                report.rows_scored,
                report.features.len()
            ),
            score.min(10.0),
        ))
    }
}

fn correlation_insight(finding: &CorrelationFinding) -> Insight {
    let significance = if finding.is_significant() {
        format!("significant at p < {SIGNIFICANCE_THRESHOLD}")
    } else {
        "not statistically significant".to_string()
    };
    Insight::new(
        InsightType::Correlation,
        format!(
            "{} Correlation Between {} and {}",
            title_case(finding.strength.as_str()),
            title_case(&finding.variable1),
            title_case(&finding.variable2)
        ),
        format!(
            "Correlation coefficient: {:.2} (p = {:.4}, n = {}, {significance})",
            finding.coefficient, finding.p_value, finding.sample_count
        ),
        10.0 * finding.abs_coefficient,
    )
}

/// `defect_count` -> `Defect Count`
fn title_case(s: &str) -> String {
    s.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CorrelationStrength, Severity};

    fn trend(previous: f64, recent: f64) -> TrendSummary {
        TrendSummary {
            column: "defect_count".to_string(),
            window: 100,
            previous_mean: previous,
            recent_mean: recent,
            sample_count: 500,
        }
    }

    fn finding(r: f64) -> CorrelationFinding {
        CorrelationFinding {
            variable1: "temperature".to_string(),
            variable2: "defect_count".to_string(),
            coefficient: r,
            abs_coefficient: r.abs(),
            p_value: 0.0,
            strength: CorrelationStrength::from_abs(r.abs()),
            sample_count: 200,
        }
    }

    fn anomalies(rate: f64) -> AnomalyReport {
        AnomalyReport {
            anomalies: Vec::new(),
            total_anomalies: (rate * 100.0) as usize,
            anomaly_rate: rate,
            threshold: -0.5,
            contamination: 0.1,
            features: vec!["a".into(), "b".into()],
            rows_scored: 100,
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("defect_count"), "Defect Count");
        assert_eq!(title_case("very_strong"), "Very Strong");
    }

    #[test]
    fn test_trend_scoring() {
        let ranker = InsightRanker::default();
        let insights = ranker.rank(Some(&trend(2.0, 3.0)), &[], None);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, "Rising Defect Count Trend");
        assert!((insights[0].score - 5.0).abs() < 1e-9);
        assert_eq!(insights[0].severity, Severity::Medium);

        let falling = ranker.rank(Some(&trend(4.0, 2.0)), &[], None);
        assert!(falling[0].title.starts_with("Falling"));

        // 5% change stays below the 10% floor
        assert!(ranker.rank(Some(&trend(2.0, 2.1)), &[], None).is_empty());
    }

    #[test]
    fn test_correlation_cap_and_order() {
        let ranker = InsightRanker::default();
        let findings: Vec<_> = [0.95, 0.9, 0.8, 0.75, 0.7, 0.6, 0.55].map(finding).to_vec();
        let insights = ranker.rank(None, &findings, None);
        assert_eq!(insights.len(), 5);
        assert!((insights[0].score - 9.5).abs() < 1e-9);
        assert_eq!(insights[0].severity, Severity::Critical);
    }

    #[test]
    fn test_correlation_significance_reported() {
        let ranker = InsightRanker::default();
        let strong = &ranker.rank(None, &[finding(0.9)], None)[0];
        assert!(strong.description.ends_with("significant at p < 0.05)"));

        let mut weak = finding(0.6);
        weak.p_value = 0.2;
        let insight = &ranker.rank(None, &[weak], None)[0];
        assert!(insight.description.contains("not statistically significant"));
    }

    #[test]
    fn test_anomaly_score_capped() {
        let ranker = InsightRanker::default();
        let insight = &ranker.rank(None, &[], Some(&anomalies(0.1)))[0];
        assert!((insight.score - 5.0).abs() < 1e-9);
        let capped = &ranker.rank(None, &[], Some(&anomalies(0.4)))[0];
        assert_eq!(capped.score, 10.0);
        assert!(ranker.rank(None, &[], Some(&anomalies(0.0))).is_empty());
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let ranker = InsightRanker::default();
        // trend 50% -> 5.0, correlation 0.5 -> 5.0, anomaly 0.2 -> 10.0
        let insights = ranker.rank(
            Some(&trend(2.0, 3.0)),
            &[finding(0.5)],
            Some(&anomalies(0.2)),
        );
        let types: Vec<_> = insights.iter().map(|i| i.insight_type).collect();
        assert_eq!(
            types,
            vec![InsightType::Anomaly, InsightType::Trend, InsightType::Correlation]
        );
    }
}
