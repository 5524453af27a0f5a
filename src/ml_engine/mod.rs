//! Analytics Engine for Manufacturing Quality Records
//!
//! Turns a tabular dataset of non-conformance records into descriptive
//! statistics, significant correlations, anomalous records and ranked
//! insights.
//!
//! ## Architecture
//! - `stats`: overview, column metadata, dashboard, time buckets, trend
//! - `correlations`: Pearson correlation with p-value testing (statrs)
//! - `isolation_forest`: seeded parallel isolation forest (rand + rayon)
//! - `anomaly`: feature preparation, scoring and per-row explanation
//! - `insights`: 0-10 scoring of trend / correlation / anomaly signals
//! - `analyzer`: orchestrator exposing every operation

pub mod stats;
pub mod correlations;
pub mod isolation_forest;
pub mod anomaly;
pub mod insights;
pub mod analyzer;

// Re-export public types
pub use stats::StatsAnalyzer;
pub use correlations::CorrelationEngine;
pub use isolation_forest::{FitInterrupted, ForestParams, IsolationForest};
pub use anomaly::AnomalyEngine;
pub use insights::InsightRanker;
pub use analyzer::AnalyticsEngine;
