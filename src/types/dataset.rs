//! Dataset types: typed columns, missing-aware values and a stable row index.
//!
//! A [`Dataset`] is built once by the loader and never mutated afterwards.
//! Storage is columnar so numeric scans don't have to walk row maps.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// Declared kind of a column. Fixed for the lifetime of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Datetime,
    Identifier,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Datetime => "datetime",
            Self::Identifier => "identifier",
        }
    }

    /// Whether a value may be stored in a column of this kind.
    ///
    /// `Missing` is accepted everywhere.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Missing)
                | (Self::Numeric, Value::Number(_))
                | (Self::Categorical | Self::Identifier, Value::Text(_))
                | (Self::Datetime, Value::Timestamp(_))
        )
    }

    /// Categorical and identifier columns both hold labels.
    pub fn is_label(&self) -> bool {
        matches!(self, Self::Categorical | Self::Identifier)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single cell. Missing is distinct from zero and from the empty string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Number(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Equality against a raw filter value as supplied by a request.
    ///
    /// Numbers compare numerically, timestamps compare against their
    /// `%Y-%m-%d %H:%M:%S` rendering, missing never matches.
    pub fn matches_str(&self, raw: &str) -> bool {
        match self {
            Self::Missing => false,
            Self::Text(s) => s == raw,
            Self::Number(v) => raw
                .trim()
                .parse::<f64>()
                .map(|r| (r - v).abs() < f64::EPSILON)
                .unwrap_or(false),
            Self::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string() == raw,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, ""),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::Missing, Self::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Self::Timestamp(ts)
    }
}

/// Parse an ISO-8601 date, date-time or RFC 3339 timestamp.
///
/// Offsets are normalised to UTC; a bare date means midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Column schema entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Snapshot of one row keyed by column name.
pub type RowSnapshot = BTreeMap<String, Value>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Row {row} has {found} values, schema has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Column '{column}' has {found} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Row {row}: value in column '{column}' contradicts its {expected} kind")]
    KindMismatch {
        column: String,
        row: usize,
        expected: ColumnKind,
    },
}

/// Immutable tabular dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    /// `data[column][row]`
    data: Vec<Vec<Value>>,
    row_count: usize,
    index: HashMap<String, usize>,
}

impl Dataset {
    /// Build from row-major values, validating shape and column kinds.
    pub fn from_rows(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self, DatasetError> {
        let width = columns.len();
        let mut data: Vec<Vec<Value>> = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(DatasetError::RaggedRow {
                    row: row_idx,
                    expected: width,
                    found: row.len(),
                });
            }
            for (col_idx, value) in row.into_iter().enumerate() {
                data[col_idx].push(value);
            }
        }

        let row_count = data.first().map_or(0, Vec::len);
        Self::assemble(columns, data, row_count)
    }

    /// Build from column-major values.
    pub fn from_columns(columns: Vec<(Column, Vec<Value>)>) -> Result<Self, DatasetError> {
        let row_count = columns.first().map_or(0, |(_, v)| v.len());
        for (column, values) in &columns {
            if values.len() != row_count {
                return Err(DatasetError::ColumnLength {
                    column: column.name.clone(),
                    expected: row_count,
                    found: values.len(),
                });
            }
        }
        let (schema, data): (Vec<_>, Vec<_>) = columns.into_iter().unzip();
        Self::assemble(schema, data, row_count)
    }

    fn assemble(
        columns: Vec<Column>,
        data: Vec<Vec<Value>>,
        row_count: usize,
    ) -> Result<Self, DatasetError> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if index.insert(column.name.clone(), i).is_some() {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
        }

        for (column, values) in columns.iter().zip(&data) {
            if let Some(row) = values.iter().position(|v| !column.kind.accepts(v)) {
                return Err(DatasetError::KindMismatch {
                    column: column.name.clone(),
                    row,
                    expected: column.kind,
                });
            }
        }

        Ok(Self {
            columns,
            data,
            row_count,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Names of all columns of the given kind, in schema order.
    pub fn names_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Raw values of a column.
    pub fn values(&self, name: &str) -> Option<&[Value]> {
        self.index.get(name).map(|&i| self.data[i].as_slice())
    }

    /// Numeric view of a column (`None` per missing cell).
    ///
    /// Returns `None` if the column is absent or not numeric.
    pub fn numeric(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let column = self.column(name)?;
        if column.kind != ColumnKind::Numeric {
            return None;
        }
        self.values(name)
            .map(|values| values.iter().map(Value::as_f64).collect())
    }

    /// Label view of a categorical or identifier column.
    pub fn labels(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let column = self.column(name)?;
        if !column.kind.is_label() {
            return None;
        }
        self.values(name)
            .map(|values| values.iter().map(Value::as_text).collect())
    }

    /// Timestamp view of a datetime column.
    pub fn timestamps(&self, name: &str) -> Option<Vec<Option<NaiveDateTime>>> {
        let column = self.column(name)?;
        if column.kind != ColumnKind::Datetime {
            return None;
        }
        self.values(name)
            .map(|values| values.iter().map(Value::as_timestamp).collect())
    }

    /// Snapshot of a row keyed by column name.
    pub fn row(&self, row: usize) -> Option<RowSnapshot> {
        if row >= self.row_count {
            return None;
        }
        Some(
            self.columns
                .iter()
                .zip(&self.data)
                .map(|(c, values)| (c.name.clone(), values[row].clone()))
                .collect(),
        )
    }

    /// New dataset holding only the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let data = self
            .data
            .iter()
            .map(|values| rows.iter().filter_map(|&r| values.get(r).cloned()).collect())
            .collect();
        Self {
            columns: self.columns.clone(),
            data,
            row_count: rows.iter().filter(|&&r| r < self.row_count).count(),
            index: self.index.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<Column> {
        vec![
            Column::new("temperature", ColumnKind::Numeric),
            Column::new("machine_id", ColumnKind::Identifier),
        ]
    }

    #[test]
    fn test_from_rows_builds_columnar_view() {
        let ds = Dataset::from_rows(
            schema(),
            vec![
                vec![Value::Number(70.0), Value::from("M001")],
                vec![Value::Missing, Value::from("M002")],
            ],
        )
        .unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.numeric("temperature").unwrap(), vec![Some(70.0), None]);
        assert_eq!(ds.labels("machine_id").unwrap(), vec![Some("M001"), Some("M002")]);
        assert!(ds.numeric("machine_id").is_none());
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let err = Dataset::from_rows(
            schema(),
            vec![vec![Value::from("hot"), Value::from("M001")]],
        )
        .unwrap_err();
        assert!(matches!(err, DatasetError::KindMismatch { ref column, row: 0, .. } if column == "temperature"));
    }

    #[test]
    fn test_ragged_row_rejected() {
        let err = Dataset::from_rows(schema(), vec![vec![Value::Number(1.0)]]).unwrap_err();
        assert!(matches!(err, DatasetError::RaggedRow { row: 0, expected: 2, found: 1 }));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let cols = vec![
            Column::new("a", ColumnKind::Numeric),
            Column::new("a", ColumnKind::Numeric),
        ];
        let err = Dataset::from_rows(cols, Vec::new()).unwrap_err();
        assert_eq!(err, DatasetError::DuplicateColumn("a".to_string()));
    }

    #[test]
    fn test_missing_is_not_zero_or_empty() {
        assert!(Value::Missing.as_f64().is_none());
        assert!(Value::Missing.as_text().is_none());
        assert_ne!(Value::Missing, Value::Number(0.0));
        assert_ne!(Value::Missing, Value::from(""));
    }

    #[test]
    fn test_select_rows_keeps_schema() {
        let ds = Dataset::from_rows(
            schema(),
            vec![
                vec![Value::Number(1.0), Value::from("A")],
                vec![Value::Number(2.0), Value::from("B")],
                vec![Value::Number(3.0), Value::from("C")],
            ],
        )
        .unwrap();
        let subset = ds.select_rows(&[2, 0]);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.numeric("temperature").unwrap(), vec![Some(3.0), Some(1.0)]);
        assert_eq!(subset.columns(), ds.columns());
    }

    #[test]
    fn test_value_matches_filter_strings() {
        assert!(Value::from("Line A").matches_str("Line A"));
        assert!(Value::Number(3.0).matches_str("3"));
        assert!(!Value::Missing.matches_str(""));
    }

    #[test]
    fn test_row_snapshot_serializes_missing_as_null() {
        let ds = Dataset::from_rows(
            schema(),
            vec![vec![Value::Missing, Value::from("M001")]],
        )
        .unwrap();
        let json = serde_json::to_value(ds.row(0).unwrap()).unwrap();
        assert!(json["temperature"].is_null());
        assert_eq!(json["machine_id"], "M001");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let at = |d: u32, h: u32, m: u32| {
            NaiveDate::from_ymd_opt(2024, 3, d).unwrap().and_hms_opt(h, m, 0).unwrap()
        };
        assert_eq!(parse_timestamp("2024-03-01"), Some(at(1, 0, 0)));
        assert_eq!(parse_timestamp("2024-03-01 14:30:00"), Some(at(1, 14, 30)));
        assert_eq!(parse_timestamp("2024-03-01T14:30:00"), Some(at(1, 14, 30)));
        assert_eq!(parse_timestamp("2024-03-01T14:30:00+02:00"), Some(at(1, 12, 30)));
        assert_eq!(parse_timestamp("2024-03-01T14:30:00Z"), Some(at(1, 14, 30)));
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-01"), None);
    }
}
