//! Shared data structures for the quality analytics pipeline
//!
//! This module defines the value objects that flow between components:
//! - Dataset: typed columnar input supplied by the loader
//! - Stats: overview, column metadata, time-bucketed aggregates, trends
//! - Correlation: pairwise findings with strength bands
//! - Anomaly: scored rows and feature explanations
//! - Insight: scored, severity-tagged summaries
//! - RootCause: ranked hypotheses with findings and confidence
//! - Action: prioritized corrective actions

mod dataset;
mod stats;
mod correlation;
mod anomaly;
mod insight;
mod root_cause;
mod action;
pub mod thresholds;

pub use dataset::*;
pub use stats::*;
pub use correlation::*;
pub use anomaly::*;
pub use insight::*;
pub use root_cause::*;
pub use action::*;
