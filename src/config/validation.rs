//! Config validation: unknown-key detection with Levenshtein suggestions.
//!
//! The raw TOML is walked as a `toml::Value` tree before serde
//! deserialization. Every dotted key path that is not a known field produces a
//! warning with a "did you mean?" suggestion. Warnings never break a config.

use std::collections::HashSet;

/// A non-fatal config warning (typo, misplaced key).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path for `AnalyticsConfig`.
///
/// Must track the struct hierarchy in analytics_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [schema]
        "schema",
        "schema.timestamp_column",
        "schema.equipment_column",
        "schema.operator_column",
        "schema.shift_column",
        "schema.issue_type_column",
        "schema.severity_column",
        "schema.line_column",
        "schema.defect_column",
        "schema.environmental_columns",
        // [stats]
        "stats",
        "stats.dashboard_numeric_columns",
        "stats.top_values",
        "stats.default_sample_limit",
        // [correlation]
        "correlation",
        "correlation.default_threshold",
        "correlation.min_paired_observations",
        // [anomaly]
        "anomaly",
        "anomaly.contamination",
        "anomaly.n_trees",
        "anomaly.max_samples",
        "anomaly.seed",
        "anomaly.default_limit",
        "anomaly.min_rows",
        "anomaly.min_features",
        "anomaly.fit_timeout_ms",
        // [root_cause]
        "root_cause",
        "root_cause.hourly_sigma",
        "root_cause.shift_dominance_ratio",
        "root_cause.equipment_rate_threshold",
        "root_cause.operator_rate_threshold",
        "root_cause.min_operator_samples",
        "root_cause.environmental_correlation",
        "root_cause.sample_adequacy_floor",
        "root_cause.confidence_base_weight",
        // [insights]
        "insights",
        "insights.trend_window",
        "insights.trend_min_change",
        "insights.reference_anomaly_rate",
        "insights.max_correlation_insights",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// A table `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key within edit distance 3. Ties resolve alphabetically.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), *k))
        .filter(|(d, _)| *d <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Warnings for every unknown key in a raw TOML document.
///
/// Syntax errors return no warnings; serde reports them afterwards.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}
