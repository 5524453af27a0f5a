//! System-wide default constants.
//!
//! Every tunable in [`AnalyticsConfig`](super::AnalyticsConfig) defaults to a
//! value defined here. Grouped by component for easy discovery.

// ============================================================================
// Schema (column names the detectors look for)
// ============================================================================

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const EQUIPMENT_COLUMN: &str = "machine_id";
pub const OPERATOR_COLUMN: &str = "operator_id";
pub const SHIFT_COLUMN: &str = "shift";
pub const ISSUE_TYPE_COLUMN: &str = "ncr_type";
pub const SEVERITY_COLUMN: &str = "severity";
pub const LINE_COLUMN: &str = "production_line";
pub const DEFECT_COLUMN: &str = "defect_count";

/// Numeric columns treated as environmental conditions.
pub const ENVIRONMENTAL_COLUMNS: &[&str] = &["temperature", "pressure", "vibration", "humidity"];

// ============================================================================
// Stats
// ============================================================================

/// Numeric columns summarised on the dashboard.
pub const DASHBOARD_NUMERIC_COLUMNS: usize = 10;

/// Most frequent labels reported per categorical column.
pub const TOP_VALUES: usize = 10;

/// Rows returned by the sample operation when no limit is given.
pub const DEFAULT_SAMPLE_LIMIT: usize = 100;

// ============================================================================
// Correlation Engine
// ============================================================================

/// Minimum |r| reported when the caller gives no threshold.
pub const CORRELATION_THRESHOLD: f64 = 0.5;

/// Paired non-missing observations required to compute r.
pub const MIN_PAIRED_OBSERVATIONS: usize = 2;

// ============================================================================
// Anomaly Engine
// ============================================================================

/// Assumed fraction of anomalous rows.
pub const CONTAMINATION: f64 = 0.1;

/// Isolation trees per forest.
pub const FOREST_TREES: usize = 100;

/// Sub-sample size per tree (psi).
pub const FOREST_MAX_SAMPLES: usize = 256;

/// Forest RNG seed. Fixed so repeated calls rank identically.
pub const FOREST_SEED: u64 = 42;

/// Anomalies returned when the caller gives no limit.
pub const ANOMALY_LIMIT: usize = 50;

/// Rows below which the forest is not meaningful.
pub const MIN_ANOMALY_ROWS: usize = 10;

/// Numeric feature columns required by the forest.
pub const MIN_ANOMALY_FEATURES: usize = 2;

/// Budget for fitting and scoring the forest (ms).
pub const FIT_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// Root Cause Engine
// ============================================================================

/// Standard deviations above the mean hourly count that flag an hour.
pub const HOURLY_SIGMA: f64 = 1.0;

/// Dominant/runner-up count ratio that flags a shift when only two exist.
pub const SHIFT_DOMINANCE_RATIO: f64 = 1.3;

/// Issue count relative to the per-equipment mean that flags equipment.
pub const EQUIPMENT_RATE_THRESHOLD: f64 = 1.5;

/// Issue count relative to the per-operator mean that flags an operator.
pub const OPERATOR_RATE_THRESHOLD: f64 = 1.5;

/// Records an operator needs before they can be flagged.
pub const MIN_OPERATOR_SAMPLES: usize = 5;

/// |r| between an environmental column and the issue indicator that flags it.
pub const ENVIRONMENTAL_CORRELATION: f64 = 0.3;

/// Sample size at which a detector's evidence is considered fully adequate.
pub const SAMPLE_ADEQUACY_FLOOR: usize = 30;

/// Share of confidence granted for merely crossing a threshold.
pub const CONFIDENCE_BASE_WEIGHT: f64 = 0.4;

// ============================================================================
// Insight Ranker
// ============================================================================

/// Rows in each of the early/late trend windows.
pub const TREND_WINDOW: usize = 100;

/// Relative change below which no trend insight is emitted.
pub const TREND_MIN_CHANGE: f64 = 0.1;

/// Anomaly rate that scores 5/10.
pub const REFERENCE_ANOMALY_RATE: f64 = 0.1;

/// Correlation insights emitted per call.
pub const MAX_CORRELATION_INSIGHTS: usize = 5;
