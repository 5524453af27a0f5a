//! Config Loading Tests
//!
//! File-based loading, range validation and typo detection for
//! `analytics_config.toml`, exercised through the public config API.

use std::fs;

use ncr_analytics::config::validation::{known_config_keys, suggest_correction, validate_unknown_keys};
use ncr_analytics::config::{AnalyticsConfig, ConfigError};

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analytics_config.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn partial_file_keeps_defaults_for_the_rest() {
    let (_dir, path) = write_config(
        r#"
[schema]
defect_column = "scrap_qty"
environmental_columns = ["oven_temp"]

[anomaly]
contamination = 0.05
n_trees = 50
"#,
    );
    let config = AnalyticsConfig::load_from_file(&path).unwrap();
    let defaults = AnalyticsConfig::default();

    assert_eq!(config.schema.defect_column, "scrap_qty");
    assert_eq!(config.schema.environmental_columns, vec!["oven_temp".to_string()]);
    assert_eq!(config.anomaly.contamination, 0.05);
    assert_eq!(config.anomaly.n_trees, 50);
    assert_eq!(config.anomaly.seed, defaults.anomaly.seed);
    assert_eq!(config.correlation, defaults.correlation);
    assert_eq!(config.root_cause, defaults.root_cause);
}

#[test]
fn empty_file_is_all_defaults() {
    let (_dir, path) = write_config("");
    assert_eq!(AnalyticsConfig::load_from_file(&path).unwrap(), AnalyticsConfig::default());
}

#[test]
fn written_config_loads_back_identically() {
    let mut config = AnalyticsConfig::default();
    config.correlation.default_threshold = 0.65;
    config.root_cause.min_operator_samples = 8;
    config.insights.trend_window = 14;

    let (_dir, path) = write_config(&config.to_toml().unwrap());
    assert_eq!(AnalyticsConfig::load_from_file(&path).unwrap(), config);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AnalyticsConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}

#[test]
fn malformed_toml_reports_the_file() {
    let (_dir, path) = write_config("[anomaly\ncontamination = ");
    match AnalyticsConfig::load_from_file(&path).unwrap_err() {
        ConfigError::Parse(reported, _) => assert_eq!(reported, path),
        other => panic!("expected parse error, got {other}"),
    }
}

#[test]
fn wrong_value_type_is_parse_error() {
    let (_dir, path) = write_config("[anomaly]\nn_trees = \"many\"\n");
    assert!(matches!(
        AnalyticsConfig::load_from_file(&path).unwrap_err(),
        ConfigError::Parse(..)
    ));
}

// ============================================================================
// Range validation
// ============================================================================

#[test]
fn every_range_violation_is_reported() {
    let (_dir, path) = write_config(
        r#"
[correlation]
default_threshold = 1.5

[anomaly]
contamination = 0.9
fit_timeout_ms = 0

[root_cause]
shift_dominance_ratio = 0.5
"#,
    );
    match AnalyticsConfig::load_from_file(&path).unwrap_err() {
        ConfigError::Validation(errors) => {
            assert_eq!(errors.len(), 4, "{errors:?}");
            assert!(errors.iter().any(|e| e.starts_with("correlation.default_threshold")));
            assert!(errors.iter().any(|e| e.starts_with("anomaly.contamination")));
            assert!(errors.iter().any(|e| e.starts_with("anomaly.fit_timeout_ms")));
            assert!(errors.iter().any(|e| e.starts_with("root_cause.shift_dominance_ratio")));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn defaults_pass_validation() {
    assert!(AnalyticsConfig::default().validate().is_ok());
}

// ============================================================================
// Typo detection
// ============================================================================

#[test]
fn typo_warns_with_suggestion_but_still_loads() {
    let contents = "[anomaly]\ncontamnation = 0.2\n";
    let warnings = validate_unknown_keys(contents);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "anomaly.contamnation");
    assert_eq!(warnings[0].suggestion.as_deref(), Some("anomaly.contamination"));

    // The misspelt key is ignored, the default survives
    let (_dir, path) = write_config(contents);
    let config = AnalyticsConfig::load_from_file(&path).unwrap();
    assert_eq!(config.anomaly.contamination, AnalyticsConfig::default().anomaly.contamination);
}

#[test]
fn unknown_section_warns() {
    let warnings = validate_unknown_keys("[forecasting]\nhorizon = 7\n");
    assert!(!warnings.is_empty());
    assert!(warnings.iter().any(|w| w.field.starts_with("forecasting")));
}

#[test]
fn serialized_defaults_produce_no_warnings() {
    let toml = AnalyticsConfig::default().to_toml().unwrap();
    assert!(validate_unknown_keys(&toml).is_empty());
}

#[test]
fn garbage_key_gets_no_suggestion() {
    assert_eq!(suggest_correction("zzzzzzzzzzzzzz", &known_config_keys()), None);
}
