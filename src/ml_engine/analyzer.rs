//! Analytics Orchestrator
//!
//! `AnalyticsEngine` owns the configuration and every component, and exposes
//! one method per public operation. All methods read an immutable dataset
//! snapshot; none of them mutate engine state.
//!
//! Composite insight generation:
//! 1. Apply the record filter
//! 2. Trend summary on the defect column
//! 3. Correlation and anomaly analyses as parallel blocking tasks, the
//!    anomaly fit bounded by `tokio::time::timeout` plus a cancellation token
//! 4. Ranking

use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{AnomalyEngine, CorrelationEngine, InsightRanker, StatsAnalyzer};
use crate::actions::ActionRecommender;
use crate::config::AnalyticsConfig;
use crate::error::AnalysisError;
use crate::root_cause::RootCauseEngine;
use crate::types::{
    ActionPlan, AnomalyFeatures, AnomalyReport, ColumnInfo, ColumnKind, CorrelationReport,
    DashboardStats, Dataset, DatasetOverview, InsightReport, RecordFilter, RootCause,
    RootCauseReport, SampleRows, TimeSeries, TimeSeriesQuery,
};

pub struct AnalyticsEngine {
    config: AnalyticsConfig,
    stats: StatsAnalyzer,
    correlation: CorrelationEngine,
    anomaly: AnomalyEngine,
    root_cause: RootCauseEngine,
    ranker: InsightRanker,
    recommender: ActionRecommender,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            stats: StatsAnalyzer::new(config.schema.clone(), config.stats.clone()),
            correlation: CorrelationEngine::new(config.correlation.clone()),
            anomaly: AnomalyEngine::new(config.anomaly.clone()),
            root_cause: RootCauseEngine::new(config.schema.clone(), config.root_cause.clone()),
            ranker: InsightRanker::new(config.insights.clone()),
            recommender: ActionRecommender,
            config,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Descriptive statistics
    // ------------------------------------------------------------------------

    pub fn overview(&self, dataset: &Dataset) -> DatasetOverview {
        self.stats.overview(dataset)
    }

    pub fn columns(&self, dataset: &Dataset) -> Vec<ColumnInfo> {
        self.stats.columns_info(dataset)
    }

    pub fn dashboard(&self, dataset: &Dataset) -> DashboardStats {
        self.stats.dashboard(dataset)
    }

    pub fn sample(&self, dataset: &Dataset, limit: Option<usize>) -> SampleRows {
        self.stats.sample(dataset, limit)
    }

    pub fn time_series(
        &self,
        dataset: &Dataset,
        query: &TimeSeriesQuery,
    ) -> Result<TimeSeries, AnalysisError> {
        self.stats.time_series(dataset, query)
    }

    // ------------------------------------------------------------------------
    // Correlation / anomaly
    // ------------------------------------------------------------------------

    pub fn correlations(
        &self,
        dataset: &Dataset,
        threshold: Option<f64>,
    ) -> Result<CorrelationReport, AnalysisError> {
        self.correlation.analyze(dataset, threshold)
    }

    /// Synchronous anomaly detection, bounded by the configured fit deadline.
    pub fn anomalies(
        &self,
        dataset: &Dataset,
        limit: Option<usize>,
    ) -> Result<AnomalyReport, AnalysisError> {
        self.anomaly.detect(dataset, limit, &CancellationToken::new())
    }

    /// Anomaly detection on the blocking pool, cancelled when `fit_timeout_ms`
    /// elapses.
    pub async fn anomalies_async(
        &self,
        dataset: Arc<Dataset>,
        limit: Option<usize>,
    ) -> Result<AnomalyReport, AnalysisError> {
        let engine = self.anomaly.clone();
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let handle =
            tokio::task::spawn_blocking(move || engine.detect(&dataset, limit, &task_cancel));

        match tokio::time::timeout(self.anomaly.fit_timeout(), handle).await {
            Ok(joined) => joined.map_err(|e| {
                AnalysisError::failed("anomaly", None, format!("worker task failed: {e}"))
            })?,
            Err(_) => {
                cancel.cancel();
                warn!(
                    timeout_ms = self.config.anomaly.fit_timeout_ms,
                    "Anomaly fit timed out, cancelling"
                );
                Err(AnalysisError::AnalysisTimeout {
                    component: "anomaly",
                    timeout_ms: self.config.anomaly.fit_timeout_ms,
                })
            }
        }
    }

    pub fn anomaly_features(
        &self,
        dataset: &Dataset,
        index: usize,
    ) -> Result<AnomalyFeatures, AnalysisError> {
        self.anomaly.explain(dataset, index)
    }

    // ------------------------------------------------------------------------
    // Root cause / actions
    // ------------------------------------------------------------------------

    pub fn root_cause(
        &self,
        dataset: &Dataset,
        filter: &RecordFilter,
    ) -> Result<RootCauseReport, AnalysisError> {
        self.root_cause.analyze(dataset, filter)
    }

    pub fn recommend(&self, cause: &RootCause, issue_type: Option<&str>) -> ActionPlan {
        self.recommender.recommend(cause, issue_type)
    }

    /// Root-cause analysis followed by recommendations for the top cause.
    ///
    /// `Ok(None)` when no root cause was found.
    pub fn actions(
        &self,
        dataset: &Dataset,
        filter: &RecordFilter,
    ) -> Result<Option<ActionPlan>, AnalysisError> {
        let report = self.root_cause.analyze(dataset, filter)?;
        Ok(report
            .root_causes
            .first()
            .map(|cause| self.recommend(cause, filter.issue_type.as_deref())))
    }

    // ------------------------------------------------------------------------
    // Insights
    // ------------------------------------------------------------------------

    /// Ranked insights over the filtered records.
    ///
    /// Too little data for the anomaly model omits the anomaly insight;
    /// a timeout propagates.
    pub async fn insights(
        &self,
        dataset: Arc<Dataset>,
        filter: &RecordFilter,
    ) -> Result<InsightReport, AnalysisError> {
        let filtered = if filter.is_unrestricted() {
            dataset
        } else {
            Arc::new(self.root_cause.apply_filter(&dataset, filter)?)
        };

        let defect_column = &self.config.schema.defect_column;
        let trend = match filtered.column(defect_column) {
            Some(c) if c.kind == ColumnKind::Numeric => {
                self.stats
                    .trend(&filtered, defect_column, self.ranker.trend_window())?
            }
            _ => {
                debug!(column = %defect_column, "No numeric defect column, skipping trend");
                None
            }
        };

        let correlation_engine = self.correlation.clone();
        let correlation_data = Arc::clone(&filtered);
        let correlation_task = tokio::task::spawn_blocking(move || {
            correlation_engine.analyze(&correlation_data, None)
        });
        let anomaly_task = self.anomalies_async(Arc::clone(&filtered), None);

        let (correlations, anomalies) = tokio::join!(correlation_task, anomaly_task);

        let correlations = correlations.map_err(|e| {
            AnalysisError::failed("correlation", None, format!("worker task failed: {e}"))
        })??;
        let anomalies = match anomalies {
            Ok(report) => Some(report),
            Err(AnalysisError::InsufficientData {
                what,
                required,
                available,
            }) => {
                debug!(what, required, available, "Not enough data for anomaly insight");
                None
            }
            Err(e) => return Err(e),
        };

        let insights = self.ranker.rank(
            trend.as_ref(),
            &correlations.correlations,
            anomalies.as_ref(),
        );

        info!(
            rows = filtered.len(),
            insights = insights.len(),
            "Insight generation complete"
        );

        Ok(InsightReport {
            total_insights: insights.len(),
            insights,
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, InsightType, Value};

    fn dataset(rows: usize) -> Dataset {
        let columns = vec![
            Column::new("temperature", ColumnKind::Numeric),
            Column::new("defect_count", ColumnKind::Numeric),
            Column::new("ncr_type", ColumnKind::Categorical),
        ];
        let data = (0..rows)
            .map(|i| {
                let t = 20.0 + (i % 13) as f64;
                vec![
                    Value::from(t),
                    Value::from(t * 0.5 + if i >= rows / 2 { 10.0 } else { 0.0 }),
                    Value::from(if i % 2 == 0 { "Dimensional" } else { "Surface" }),
                ]
            })
            .collect();
        Dataset::from_rows(columns, data).unwrap()
    }

    #[tokio::test]
    async fn test_insights_combines_all_signals() {
        let engine = AnalyticsEngine::default();
        let report = engine
            .insights(Arc::new(dataset(400)), &RecordFilter::default())
            .await
            .unwrap();
        assert_eq!(report.total_insights, report.insights.len());
        assert!(report.insights.iter().any(|i| i.insight_type == InsightType::Trend));
        assert!(report.insights.iter().any(|i| i.insight_type == InsightType::Anomaly));
        for w in report.insights.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
    }

    #[tokio::test]
    async fn test_insights_small_dataset_omits_anomaly() {
        let engine = AnalyticsEngine::default();
        let report = engine
            .insights(Arc::new(dataset(6)), &RecordFilter::default())
            .await
            .unwrap();
        assert!(report.insights.iter().all(|i| i.insight_type != InsightType::Anomaly));
    }

    #[tokio::test]
    async fn test_insights_filter_validation() {
        let engine = AnalyticsEngine::default();
        let filter = RecordFilter::default().with_field("plant", "North");
        let err = engine.insights(Arc::new(dataset(20)), &filter).await.unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownColumn(_)));
    }

    #[tokio::test]
    async fn test_anomalies_async_times_out() {
        let mut config = AnalyticsConfig::default();
        config.anomaly.fit_timeout_ms = 1;
        config.anomaly.n_trees = 5_000;
        let engine = AnalyticsEngine::new(config);
        let result = engine.anomalies_async(Arc::new(dataset(2_000)), None).await;
        assert!(matches!(
            result,
            Err(AnalysisError::AnalysisTimeout { component: "anomaly", .. })
        ));
    }

    #[test]
    fn test_actions_for_top_cause() {
        let engine = AnalyticsEngine::default();
        let plan = engine
            .actions(&dataset(100), &RecordFilter::issue_type("Nothing"))
            .unwrap();
        assert!(plan.is_none());
    }
}
