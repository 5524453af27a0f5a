//! Call boundary for hosts
//!
//! Transport-agnostic: a host (HTTP server, CLI, job runner) picks an
//! [`Operation`], hands over raw [`RequestParams`] and gets back the JSON
//! envelope. Parameters are validated before the dataset snapshot is taken
//! and before any analysis runs.

pub mod envelope;
pub mod requests;

pub use envelope::{respond, ApiErrorResponse, ApiResponse, ErrorDetail};
pub use requests::RequestParams;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{info, warn};

use crate::dataset_store::DatasetStore;
use crate::error::AnalysisError;
use crate::ml_engine::AnalyticsEngine;

/// Every public operation of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Overview,
    Columns,
    Dashboard,
    Sample,
    TimeSeries,
    Correlations,
    Anomalies,
    AnomalyFeatures,
    RootCause,
    Insights,
    /// Root-cause analysis plus recommendations for the top cause
    Actions,
}

impl Operation {
    pub const ALL: [Self; 11] = [
        Self::Overview,
        Self::Columns,
        Self::Dashboard,
        Self::Sample,
        Self::TimeSeries,
        Self::Correlations,
        Self::Anomalies,
        Self::AnomalyFeatures,
        Self::RootCause,
        Self::Insights,
        Self::Actions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Columns => "columns",
            Self::Dashboard => "dashboard",
            Self::Sample => "sample",
            Self::TimeSeries => "time_series",
            Self::Correlations => "correlations",
            Self::Anomalies => "anomalies",
            Self::AnomalyFeatures => "anomaly_features",
            Self::RootCause => "root_cause",
            Self::Insights => "insights",
            Self::Actions => "actions",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| format!("unknown operation '{s}'"))
    }
}

/// Run one operation against the currently loaded dataset and wrap the
/// outcome in the response envelope.
pub async fn dispatch(
    engine: &AnalyticsEngine,
    store: &DatasetStore,
    operation: Operation,
    params: &RequestParams,
) -> Value {
    let started = Instant::now();
    let result = execute(engine, store, operation, params).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match &result {
        Ok(_) => info!(operation = %operation, elapsed_ms, "Operation complete"),
        Err(e) if e.is_validation() => {
            info!(operation = %operation, code = e.code(), error = %e, "Rejected request");
        }
        Err(e) => warn!(operation = %operation, code = e.code(), error = %e, elapsed_ms, "Operation failed"),
    }

    respond(result)
}

async fn execute(
    engine: &AnalyticsEngine,
    store: &DatasetStore,
    operation: Operation,
    params: &RequestParams,
) -> Result<Value, AnalysisError> {
    params.validate()?;
    let dataset = store.snapshot()?;

    match operation {
        Operation::Overview => to_data(engine.overview(&dataset)),
        Operation::Columns => to_data(engine.columns(&dataset)),
        Operation::Dashboard => to_data(engine.dashboard(&dataset)),
        Operation::Sample => to_data(engine.sample(&dataset, params.limit()?)),
        Operation::TimeSeries => {
            let query = params.time_series_query(&engine.config().schema.defect_column)?;
            to_data(engine.time_series(&dataset, &query)?)
        }
        Operation::Correlations => to_data(engine.correlations(&dataset, params.threshold()?)?),
        Operation::Anomalies => to_data(engine.anomalies_async(dataset, params.limit()?).await?),
        Operation::AnomalyFeatures => to_data(engine.anomaly_features(&dataset, params.index()?)?),
        Operation::RootCause => to_data(engine.root_cause(&dataset, &params.record_filter()?)?),
        Operation::Insights => to_data(engine.insights(dataset, &params.record_filter()?).await?),
        Operation::Actions => to_data(engine.actions(&dataset, &params.record_filter()?)?),
    }
}

fn to_data<T: Serialize>(data: T) -> Result<Value, AnalysisError> {
    serde_json::to_value(data).map_err(|e| AnalysisError::failed("serialization", None, e.to_string()))
}
