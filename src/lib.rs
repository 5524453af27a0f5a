//! NCR Analytics: Manufacturing Quality Intelligence
//!
//! Analytics engine for non-conformance records and production quality data.
//!
//! ## Architecture
//!
//! - **StatsAnalyzer**: Descriptive statistics, column classification, time buckets
//! - **CorrelationEngine**: Pairwise Pearson scan with significance and strength bands
//! - **AnomalyEngine**: Seeded isolation forest over the numeric feature space
//! - **RootCauseEngine**: Temporal, equipment, operator and environmental detectors
//! - **InsightRanker**: Scored, severity-tagged insight records
//! - **ActionRecommender**: Corrective-action templates per root-cause family
//!
//! `AnalyticsEngine` owns all of them; `api::dispatch` is the call boundary
//! for hosts and `acquisition` turns CSV exports into a `Dataset`.

pub mod acquisition;
pub mod actions;
pub mod api;
pub mod config;
pub mod dataset_store;
pub mod error;
pub mod ml_engine;
pub mod root_cause;
pub mod types;

// Re-export configuration
pub use config::{AnalyticsConfig, ConfigError};

// Re-export the engine and its components
pub use actions::ActionRecommender;
pub use ml_engine::{AnalyticsEngine, AnomalyEngine, CorrelationEngine, InsightRanker, StatsAnalyzer};
pub use root_cause::RootCauseEngine;

// Re-export commonly used types
pub use dataset_store::DatasetStore;
pub use error::AnalysisError;
pub use types::{
    ActionPlan, AnomalyReport, Column, ColumnKind, CorrelationReport, Dataset, DatasetError,
    InsightReport, RecordFilter, RootCause, RootCauseReport, Value,
};

// Re-export the call boundary
pub use acquisition::{load_csv, CsvLoader, LoadError};
pub use api::{dispatch, Operation, RequestParams};
