//! Dataset Store - the host's currently loaded dataset
//!
//! Load and clear swap an `Arc<Dataset>` atomically. Callers take a
//! snapshot at the start of each operation and keep it for the whole call,
//! so a concurrent reload never changes data under an analysis in flight.

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tracing::info;

use crate::error::AnalysisError;
use crate::types::Dataset;

#[derive(Default)]
pub struct DatasetStore {
    current: ArcSwapOption<Dataset>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loaded dataset, returning the new snapshot.
    pub fn load(&self, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        info!(
            rows = dataset.len(),
            columns = dataset.columns().len(),
            "Dataset loaded"
        );
        self.current.store(Some(Arc::clone(&dataset)));
        dataset
    }

    pub fn clear(&self) {
        if self.current.swap(None).is_some() {
            info!("Dataset cleared");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// Snapshot of the loaded dataset.
    ///
    /// A dataset without any columns counts as not loaded.
    pub fn snapshot(&self) -> Result<Arc<Dataset>, AnalysisError> {
        match self.current.load_full() {
            Some(dataset) if !dataset.columns().is_empty() => Ok(dataset),
            _ => Err(AnalysisError::NoDataLoaded),
        }
    }
}
