//! Analytics Configuration - every engine threshold as an operator-tunable TOML value
//!
//! Each section implements `Default` with the constants from
//! [`defaults`](super::defaults), so an absent or partial file behaves exactly
//! like the built-in configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "NCR_ANALYTICS_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "analytics_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the analytics engine.
///
/// Load with `AnalyticsConfig::load()` which searches:
/// 1. `$NCR_ANALYTICS_CONFIG`
/// 2. `./analytics_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Column names the detectors and dashboard look for
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Descriptive statistics
    #[serde(default)]
    pub stats: StatsConfig,

    /// Pairwise correlation scan
    #[serde(default)]
    pub correlation: CorrelationConfig,

    /// Isolation forest
    #[serde(default)]
    pub anomaly: AnomalyConfig,

    /// Root-cause detectors and confidence scoring
    #[serde(default)]
    pub root_cause: RootCauseConfig,

    /// Insight scoring rubric
    #[serde(default)]
    pub insights: InsightConfig,
}

impl AnalyticsConfig {
    /// Load configuration using the standard search order:
    /// 1. `$NCR_ANALYTICS_CONFIG` environment variable
    /// 2. `./analytics_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded analytics config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded analytics config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings and otherwise ignored.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all tunables, collecting every violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let c = &self.correlation;
        check_unit_interval(c.default_threshold, "correlation.default_threshold", &mut errors);
        if c.min_paired_observations < 2 {
            errors.push("correlation.min_paired_observations must be >= 2".to_string());
        }

        let a = &self.anomaly;
        if !(a.contamination > 0.0 && a.contamination <= 0.5) {
            errors.push(format!(
                "anomaly.contamination must be in (0, 0.5], got {}",
                a.contamination
            ));
        }
        if a.n_trees == 0 {
            errors.push("anomaly.n_trees must be > 0".to_string());
        }
        if a.max_samples < 2 {
            errors.push("anomaly.max_samples must be >= 2".to_string());
        }
        if a.default_limit == 0 {
            errors.push("anomaly.default_limit must be > 0".to_string());
        }
        if a.min_rows < 2 {
            errors.push("anomaly.min_rows must be >= 2".to_string());
        }
        if a.min_features == 0 {
            errors.push("anomaly.min_features must be > 0".to_string());
        }
        if a.fit_timeout_ms == 0 {
            errors.push("anomaly.fit_timeout_ms must be > 0".to_string());
        }

        let r = &self.root_cause;
        check_positive(r.hourly_sigma, "root_cause.hourly_sigma", &mut errors);
        check_ratio(r.shift_dominance_ratio, "root_cause.shift_dominance_ratio", &mut errors);
        check_ratio(r.equipment_rate_threshold, "root_cause.equipment_rate_threshold", &mut errors);
        check_ratio(r.operator_rate_threshold, "root_cause.operator_rate_threshold", &mut errors);
        check_unit_interval(
            r.environmental_correlation,
            "root_cause.environmental_correlation",
            &mut errors,
        );
        check_unit_interval(r.confidence_base_weight, "root_cause.confidence_base_weight", &mut errors);
        if r.sample_adequacy_floor == 0 {
            errors.push("root_cause.sample_adequacy_floor must be > 0".to_string());
        }

        let i = &self.insights;
        if i.trend_window == 0 {
            errors.push("insights.trend_window must be > 0".to_string());
        }
        check_positive(i.reference_anomaly_rate, "insights.reference_anomaly_rate", &mut errors);
        if !(i.trend_min_change.is_finite() && i.trend_min_change >= 0.0) {
            errors.push("insights.trend_min_change must be a finite value >= 0".to_string());
        }

        if self.schema.timestamp_column.trim().is_empty() {
            errors.push("schema.timestamp_column must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

fn check_unit_interval(value: f64, name: &str, errors: &mut Vec<String>) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(format!("{name} must be in [0, 1], got {value}"));
    }
}

fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(format!("{name} must be a finite value > 0, got {value}"));
    }
}

fn check_ratio(value: f64, name: &str, errors: &mut Vec<String>) {
    if !(value.is_finite() && value >= 1.0) {
        errors.push(format!("{name} must be a finite ratio >= 1.0, got {value}"));
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, Box<toml::de::Error>),

    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Schema
// ============================================================================

/// Column names. Absent columns simply disable the analyses that need them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub timestamp_column: String,
    pub equipment_column: String,
    pub operator_column: String,
    pub shift_column: String,
    pub issue_type_column: String,
    pub severity_column: String,
    pub line_column: String,
    pub defect_column: String,
    pub environmental_columns: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            timestamp_column: defaults::TIMESTAMP_COLUMN.to_string(),
            equipment_column: defaults::EQUIPMENT_COLUMN.to_string(),
            operator_column: defaults::OPERATOR_COLUMN.to_string(),
            shift_column: defaults::SHIFT_COLUMN.to_string(),
            issue_type_column: defaults::ISSUE_TYPE_COLUMN.to_string(),
            severity_column: defaults::SEVERITY_COLUMN.to_string(),
            line_column: defaults::LINE_COLUMN.to_string(),
            defect_column: defaults::DEFECT_COLUMN.to_string(),
            environmental_columns: defaults::ENVIRONMENTAL_COLUMNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

// ============================================================================
// Component Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub dashboard_numeric_columns: usize,
    pub top_values: usize,
    pub default_sample_limit: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            dashboard_numeric_columns: defaults::DASHBOARD_NUMERIC_COLUMNS,
            top_values: defaults::TOP_VALUES,
            default_sample_limit: defaults::DEFAULT_SAMPLE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Minimum |r| when the request gives no threshold
    pub default_threshold: f64,
    pub min_paired_observations: usize,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            default_threshold: defaults::CORRELATION_THRESHOLD,
            min_paired_observations: defaults::MIN_PAIRED_OBSERVATIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub contamination: f64,
    pub n_trees: usize,
    pub max_samples: usize,
    pub seed: u64,
    pub default_limit: usize,
    pub min_rows: usize,
    pub min_features: usize,
    pub fit_timeout_ms: u64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            contamination: defaults::CONTAMINATION,
            n_trees: defaults::FOREST_TREES,
            max_samples: defaults::FOREST_MAX_SAMPLES,
            seed: defaults::FOREST_SEED,
            default_limit: defaults::ANOMALY_LIMIT,
            min_rows: defaults::MIN_ANOMALY_ROWS,
            min_features: defaults::MIN_ANOMALY_FEATURES,
            fit_timeout_ms: defaults::FIT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootCauseConfig {
    pub hourly_sigma: f64,
    pub shift_dominance_ratio: f64,
    pub equipment_rate_threshold: f64,
    pub operator_rate_threshold: f64,
    pub min_operator_samples: usize,
    pub environmental_correlation: f64,
    pub sample_adequacy_floor: usize,
    pub confidence_base_weight: f64,
}

impl Default for RootCauseConfig {
    fn default() -> Self {
        Self {
            hourly_sigma: defaults::HOURLY_SIGMA,
            shift_dominance_ratio: defaults::SHIFT_DOMINANCE_RATIO,
            equipment_rate_threshold: defaults::EQUIPMENT_RATE_THRESHOLD,
            operator_rate_threshold: defaults::OPERATOR_RATE_THRESHOLD,
            min_operator_samples: defaults::MIN_OPERATOR_SAMPLES,
            environmental_correlation: defaults::ENVIRONMENTAL_CORRELATION,
            sample_adequacy_floor: defaults::SAMPLE_ADEQUACY_FLOOR,
            confidence_base_weight: defaults::CONFIDENCE_BASE_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    pub trend_window: usize,
    pub trend_min_change: f64,
    pub reference_anomaly_rate: f64,
    pub max_correlation_insights: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            trend_window: defaults::TREND_WINDOW,
            trend_min_change: defaults::TREND_MIN_CHANGE,
            reference_anomaly_rate: defaults::REFERENCE_ANOMALY_RATE,
            max_correlation_insights: defaults::MAX_CORRELATION_INSIGHTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(AnalyticsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalyticsConfig::from_toml_str(
            r#"
            [anomaly]
            contamination = 0.05
            "#,
        )
        .unwrap();
        assert!((config.anomaly.contamination - 0.05).abs() < 1e-12);
        assert_eq!(config.anomaly.n_trees, defaults::FOREST_TREES);
        assert_eq!(config.schema.timestamp_column, "timestamp");
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = AnalyticsConfig::default();
        config.anomaly.contamination = 0.9;
        config.correlation.default_threshold = 1.5;
        config.root_cause.sample_adequacy_floor = 0;

        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 3, "{errors:?}");
                assert!(errors.iter().any(|e| e.contains("contamination")));
                assert!(errors.iter().any(|e| e.contains("default_threshold")));
                assert!(errors.iter().any(|e| e.contains("sample_adequacy_floor")));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_nan_rejected() {
        let mut config = AnalyticsConfig::default();
        config.root_cause.hourly_sigma = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip_of_defaults() {
        let config = AnalyticsConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = AnalyticsConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
