//! Request parameter parsing and validation.
//!
//! Raw parameters arrive as strings and loosely typed numbers from whatever
//! transport the host uses. Everything is validated here, before any
//! analysis runs.

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::AnalysisError;
use crate::types::{parse_timestamp, GroupBy, RecordFilter, TimeSeriesQuery};

/// Filter keys that are date bounds rather than column matches.
const START_DATE_KEY: &str = "start_date";
const END_DATE_KEY: &str = "end_date";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RequestParams {
    pub column: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// hour, day or week
    pub group_by: Option<String>,
    pub threshold: Option<f64>,
    pub limit: Option<usize>,
    pub issue_type: Option<String>,
    /// Column name -> required value
    pub filters: BTreeMap<String, String>,
    /// Row index for anomaly feature explanation
    pub index: Option<usize>,
}

impl RequestParams {
    /// Check every supplied parameter without building anything.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.threshold()?;
        self.limit()?;
        self.group_by()?;
        self.record_filter()?;
        Ok(())
    }

    pub fn threshold(&self) -> Result<Option<f64>, AnalysisError> {
        match self.threshold {
            Some(t) if !(0.0..=1.0).contains(&t) => Err(AnalysisError::InvalidParameter {
                name: "threshold",
                reason: format!("must be within [0, 1], got {t}"),
            }),
            other => Ok(other),
        }
    }

    pub fn limit(&self) -> Result<Option<usize>, AnalysisError> {
        match self.limit {
            Some(0) => Err(AnalysisError::InvalidParameter {
                name: "limit",
                reason: "must be a positive integer".to_string(),
            }),
            other => Ok(other),
        }
    }

    pub fn group_by(&self) -> Result<GroupBy, AnalysisError> {
        match &self.group_by {
            None => Ok(GroupBy::default()),
            Some(raw) => raw
                .parse()
                .map_err(|reason| AnalysisError::InvalidParameter { name: "group_by", reason }),
        }
    }

    pub fn index(&self) -> Result<usize, AnalysisError> {
        self.index.ok_or_else(|| AnalysisError::InvalidParameter {
            name: "index",
            reason: "a row index is required".to_string(),
        })
    }

    /// Time-series query over `column`, or `default_column` when absent.
    pub fn time_series_query(&self, default_column: &str) -> Result<TimeSeriesQuery, AnalysisError> {
        let column = self.column.as_deref().unwrap_or(default_column);
        let mut query = TimeSeriesQuery::new(column, self.group_by()?);
        query.start = parse_optional("start_date", self.start_date.as_deref())?;
        query.end = parse_optional("end_date", self.end_date.as_deref())?;
        Ok(query)
    }

    /// Record filter from issue type, field filters and date bounds.
    ///
    /// `start_date` / `end_date` may also be given inside `filters`; the
    /// top-level parameters take precedence.
    pub fn record_filter(&self) -> Result<RecordFilter, AnalysisError> {
        let start = self
            .start_date
            .as_deref()
            .or_else(|| self.filters.get(START_DATE_KEY).map(String::as_str));
        let end = self
            .end_date
            .as_deref()
            .or_else(|| self.filters.get(END_DATE_KEY).map(String::as_str));

        Ok(RecordFilter {
            issue_type: self.issue_type.clone().filter(|s| !s.trim().is_empty()),
            fields: self
                .filters
                .iter()
                .filter(|(k, _)| k.as_str() != START_DATE_KEY && k.as_str() != END_DATE_KEY)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            start: parse_optional("start_date", start)?,
            end: parse_optional("end_date", end)?,
        })
    }
}

fn parse_optional(
    name: &'static str,
    raw: Option<&str>,
) -> Result<Option<NaiveDateTime>, AnalysisError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_timestamp(s).map(Some).ok_or_else(|| AnalysisError::InvalidParameter {
            name,
            reason: format!("cannot parse '{s}' as a date or date-time"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn test_threshold_bounds() {
        let mut params = RequestParams {
            threshold: Some(0.5),
            ..Default::default()
        };
        assert_eq!(params.threshold().unwrap(), Some(0.5));

        params.threshold = Some(1.5);
        assert!(matches!(
            params.validate().unwrap_err(),
            AnalysisError::InvalidParameter { name: "threshold", .. }
        ));

        params.threshold = Some(f64::NAN);
        assert!(params.threshold().is_err());
    }

    #[test]
    fn test_limit_must_be_positive() {
        let params = RequestParams {
            limit: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            params.limit().unwrap_err(),
            AnalysisError::InvalidParameter { name: "limit", .. }
        ));
    }

    #[test]
    fn test_group_by_default_and_invalid() {
        assert_eq!(RequestParams::default().group_by().unwrap(), GroupBy::Hour);
        let params = RequestParams {
            group_by: Some("month".to_string()),
            ..Default::default()
        };
        assert!(params.group_by().is_err());
    }

    #[test]
    fn test_record_filter_moves_dates_out_of_fields() {
        let mut filters = BTreeMap::new();
        filters.insert("machine_id".to_string(), "M3".to_string());
        filters.insert("start_date".to_string(), "2024-01-05".to_string());
        let params = RequestParams {
            issue_type: Some("Dimensional".to_string()),
            end_date: Some("2024-01-31".to_string()),
            filters,
            ..Default::default()
        };

        let filter = params.record_filter().unwrap();
        assert_eq!(filter.issue_type.as_deref(), Some("Dimensional"));
        assert_eq!(filter.fields.len(), 1);
        assert_eq!(filter.fields["machine_id"], "M3");
        assert_eq!(filter.start, Some(at(2024, 1, 5, 0, 0)));
        assert_eq!(filter.end, Some(at(2024, 1, 31, 0, 0)));
    }

    #[test]
    fn test_bad_date_rejected() {
        let params = RequestParams {
            start_date: Some("not-a-date".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            params.time_series_query("defect_count").unwrap_err(),
            AnalysisError::InvalidParameter { name: "start_date", .. }
        ));
    }

    #[test]
    fn test_deserialize_from_json() {
        let params: RequestParams = serde_json::from_str(
            r#"{"column": "temperature", "group_by": "day", "filters": {"shift": "Night"}}"#,
        )
        .unwrap();
        let query = params.time_series_query("defect_count").unwrap();
        assert_eq!(query.column, "temperature");
        assert_eq!(query.group_by, GroupBy::Day);
        assert_eq!(params.record_filter().unwrap().fields["shift"], "Night");
    }
}
