//! CSV Loader - parse a delimited quality export into a typed `Dataset`
//!
//! Column kinds are inferred from the values unless overridden:
//! 1. Name `id` or ending in `_id` -> identifier
//! 2. Every present value parses as a number -> numeric
//! 3. Every present value parses as a date or date-time -> datetime
//! 4. Anything else -> categorical
//!
//! Missing tokens (empty, `NA`, `NaN`, `null`, `N/A`, case-insensitive)
//! become `Value::Missing` in every kind of column.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::types::{parse_timestamp, Column, ColumnKind, Dataset, DatasetError, Value};

const MISSING_TOKENS: [&str; 5] = ["", "na", "nan", "null", "n/a"];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No header row found")]
    NoHeader,

    #[error("Line {line}: expected {expected} fields, found {found}")]
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Reference loader. The engine itself never parses raw formats.
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    kind_overrides: HashMap<String, ColumnKind>,
}

impl CsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the kind of a column instead of inferring it.
    pub fn with_kind(mut self, column: impl Into<String>, kind: ColumnKind) -> Self {
        self.kind_overrides.insert(column.into(), kind);
        self
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<Dataset, LoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = self.parse(&text)?;
        info!(
            file = %path.display(),
            rows = dataset.len(),
            columns = dataset.columns().len(),
            "CSV loaded"
        );
        Ok(dataset)
    }

    pub fn parse(&self, text: &str) -> Result<Dataset, LoadError> {
        let mut records = split_records(text.trim_start_matches('\u{feff}'))?.into_iter();
        let (_, header) = records.next().ok_or(LoadError::NoHeader)?;
        let names: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();
        let width = names.len();

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); width];
        for (line, fields) in records {
            if fields.len() != width {
                return Err(LoadError::Ragged {
                    line,
                    expected: width,
                    found: fields.len(),
                });
            }
            for (column, field) in raw.iter_mut().zip(fields) {
                column.push(field);
            }
        }

        let columns: Vec<(Column, Vec<Value>)> = names
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| {
                let kind = self
                    .kind_overrides
                    .get(&name)
                    .copied()
                    .unwrap_or_else(|| infer_kind(&name, &cells));
                debug!(column = %name, kind = %kind, "Column kind");
                let values: Vec<Value> = cells.iter().map(|cell| to_value(cell, kind)).collect();
                (Column::new(name, kind), values)
            })
            .collect();

        Ok(Dataset::from_columns(columns)?)
    }
}

/// Load a CSV file with inferred column kinds.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    CsvLoader::new().load(path)
}

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    MISSING_TOKENS.iter().any(|t| cell.eq_ignore_ascii_case(t))
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

fn infer_kind(name: &str, cells: &[String]) -> ColumnKind {
    let lower = name.to_ascii_lowercase();
    if lower == "id" || lower.ends_with("_id") {
        return ColumnKind::Identifier;
    }

    let present: Vec<&str> = cells.iter().map(String::as_str).filter(|c| !is_missing(c)).collect();
    if present.is_empty() {
        return ColumnKind::Categorical;
    }
    if present.iter().all(|c| parse_number(c).is_some()) {
        ColumnKind::Numeric
    } else if present.iter().all(|c| parse_timestamp(c).is_some()) {
        ColumnKind::Datetime
    } else {
        ColumnKind::Categorical
    }
}

/// Convert a cell for a column of `kind`. Unparseable cells in numeric or
/// datetime columns (possible only with overrides) become missing.
fn to_value(cell: &str, kind: ColumnKind) -> Value {
    if is_missing(cell) {
        return Value::Missing;
    }
    match kind {
        ColumnKind::Numeric => parse_number(cell).map_or(Value::Missing, Value::Number),
        ColumnKind::Datetime => parse_timestamp(cell).map_or(Value::Missing, Value::Timestamp),
        ColumnKind::Categorical | ColumnKind::Identifier => Value::Text(cell.trim().to_string()),
    }
}

// ============================================================================
// Quote-aware record splitting
// ============================================================================

/// Split text into records of fields, honouring quoted fields that contain
/// commas, doubled quotes or line breaks. Blank lines are skipped.
///
/// Each record carries the 1-based line number it starts on.
fn split_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, LoadError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut record_line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
                let record = std::mem::take(&mut fields);
                if !(record.len() == 1 && record[0].trim().is_empty()) {
                    records.push((record_line, record));
                }
                line += 1;
                record_line = line;
            }
            '\n' => {
                current.push(ch);
                line += 1;
            }
            _ => current.push(ch),
        }
    }

    if in_quotes {
        return Err(LoadError::UnterminatedQuote { line: record_line });
    }
    if !current.is_empty() || !fields.is_empty() {
        fields.push(current);
        if !(fields.len() == 1 && fields[0].trim().is_empty()) {
            records.push((record_line, fields));
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
timestamp,machine_id,shift,temperature,defect_count,notes
2024-01-01 08:00:00,M1,Morning,71.5,2,ok
2024-01-01 14:00:00,M2,Afternoon,NA,5,\"burr, left edge\"
2024-01-02 22:00:00,M1,Night,74.0,,\"said \"\"recheck\"\"\"
";

    #[test]
    fn test_kinds_inferred() {
        let ds = CsvLoader::new().parse(SAMPLE).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.column("timestamp").unwrap().kind, ColumnKind::Datetime);
        assert_eq!(ds.column("machine_id").unwrap().kind, ColumnKind::Identifier);
        assert_eq!(ds.column("shift").unwrap().kind, ColumnKind::Categorical);
        assert_eq!(ds.column("temperature").unwrap().kind, ColumnKind::Numeric);
        assert_eq!(ds.column("defect_count").unwrap().kind, ColumnKind::Numeric);
    }

    #[test]
    fn test_missing_and_quoted_values() {
        let ds = CsvLoader::new().parse(SAMPLE).unwrap();
        let temperature = ds.values("temperature").unwrap();
        assert!(temperature[1].is_missing());
        assert!(ds.values("defect_count").unwrap()[2].is_missing());

        let notes = ds.values("notes").unwrap();
        assert_eq!(notes[1].as_text(), Some("burr, left edge"));
        assert_eq!(notes[2].as_text(), Some("said \"recheck\""));
    }

    #[test]
    fn test_kind_override() {
        let text = "shift,defect_count\n1,3\n2,4\n";
        let ds = CsvLoader::new().with_kind("shift", ColumnKind::Categorical).parse(text).unwrap();
        assert_eq!(ds.column("shift").unwrap().kind, ColumnKind::Categorical);
        assert_eq!(ds.values("shift").unwrap()[0].as_text(), Some("1"));
    }

    #[test]
    fn test_header_only_gives_zero_rows() {
        let ds = CsvLoader::new().parse("a,b\n").unwrap();
        assert_eq!(ds.len(), 0);
        assert_eq!(ds.columns().len(), 2);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(CsvLoader::new().parse(""), Err(LoadError::NoHeader)));
        assert!(matches!(
            CsvLoader::new().parse("a,b\n1,2\n3\n"),
            Err(LoadError::Ragged { line: 3, expected: 2, found: 1 })
        ));
        assert!(matches!(
            CsvLoader::new().parse("a,b\n1,\"open\n"),
            Err(LoadError::UnterminatedQuote { line: 2 })
        ));
        assert!(matches!(
            CsvLoader::new().parse("a,a\n1,2\n"),
            Err(LoadError::Dataset(DatasetError::DuplicateColumn(_)))
        ));
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let ds = CsvLoader::new().parse("a,b\r\n1,2\r\n\r\n3,4\r\n").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.values("a").unwrap()[1].as_f64(), Some(3.0));
    }
}
