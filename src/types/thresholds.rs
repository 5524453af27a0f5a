//! Classification bands shared by the analytics components.
//!
//! Every continuous-to-discrete mapping in the engine (correlation strength,
//! insight severity, action priority) reads its cut-offs from here so the
//! bands can be tested in isolation.

/// Correlation strength bands on |r|.
pub mod strength {
    pub const VERY_STRONG: f64 = 0.9;
    pub const STRONG: f64 = 0.7;
    pub const MODERATE: f64 = 0.5;
}

/// Insight severity bands on the 0-10 score.
pub mod severity {
    pub const CRITICAL: f64 = 8.0;
    pub const HIGH: f64 = 6.0;
    pub const MEDIUM: f64 = 4.0;
    /// Upper bound of the insight score scale.
    pub const MAX_SCORE: f64 = 10.0;
}

/// Action priority bands on root-cause confidence.
pub mod priority {
    pub const HIGH: f64 = 0.7;
    pub const MEDIUM: f64 = 0.4;
}

/// P-value below which a correlation is reported as significant.
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// |z| above which an anomaly feature is called out as an outlier.
pub const FEATURE_OUTLIER_Z: f64 = 2.0;
