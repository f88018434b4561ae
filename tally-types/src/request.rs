//! Caller-facing request primitives: date ranges, output formats and report requests.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TallyError;

/// Media type declared for true spreadsheet output.
pub const XLSX_MEDIA_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Media type declared for delimited-text output.
pub const CSV_MEDIA_TYPE: &str = "text/csv";
/// Media type declared for JSON output.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Inclusive calendar date range. `start <= end` holds for every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `start > end`.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the start date is after the end date.
    pub fn try_new(start: NaiveDate, end: NaiveDate) -> Result<Self, TallyError> {
        if start > end {
            return Err(TallyError::InvalidArg(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a range from two `YYYY-MM-DD` strings.
    ///
    /// # Errors
    /// Returns `InvalidArg` for malformed dates or an inverted range.
    pub fn parse(start: &str, end: &str) -> Result<Self, TallyError> {
        let parse = |label: &str, s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
                TallyError::InvalidArg(format!("{label} date '{s}' is not YYYY-MM-DD: {e}"))
            })
        };
        Self::try_new(parse("start", start)?, parse("end", end)?)
    }

    /// First day of the range.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }
}

impl<'de> Deserialize<'de> for DateRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            start: NaiveDate,
            end: NaiveDate,
        }
        let raw = Raw::deserialize(deserializer)?;
        Self::try_new(raw.start, raw.end).map_err(serde::de::Error::custom)
    }
}

/// Output shape of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Sequence of cleaned rows.
    #[default]
    Json,
    /// Delimited text preserving upstream column order.
    Csv,
    /// Spreadsheet blob plus media type.
    Spreadsheet,
}

impl OutputFormat {
    /// Format requested by an `Accept` header, if it names one.
    ///
    /// The spreadsheet media type is checked first, then `text/csv`, then
    /// `application/json`.
    #[must_use]
    pub fn from_accept(accept: &str) -> Option<Self> {
        let accept = accept.to_ascii_lowercase();
        if accept.contains(XLSX_MEDIA_TYPE) {
            Some(Self::Spreadsheet)
        } else if accept.contains(CSV_MEDIA_TYPE) {
            Some(Self::Csv)
        } else if accept.contains(JSON_MEDIA_TYPE) {
            Some(Self::Json)
        } else {
            None
        }
    }

    /// Negotiate the effective format from an `Accept` header and a body field.
    ///
    /// A non-JSON header wins; otherwise the body choice applies.
    #[must_use]
    pub fn negotiate(accept: Option<&str>, body: Option<Self>) -> Self {
        match accept.and_then(Self::from_accept) {
            Some(header) if header != Self::Json => header,
            _ => body.unwrap_or_default(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Spreadsheet => "excel",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "excel" | "xlsx" | "spreadsheet" => Ok(Self::Spreadsheet),
            other => Err(TallyError::InvalidArg(format!(
                "format must be one of json, csv, excel (got '{other}')"
            ))),
        }
    }
}

/// A caller's report request: whose rows to keep, over which dates, in which shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Client/user identifier rows are filtered to.
    pub client_id: String,
    /// Reporting period.
    pub range: DateRange,
    /// Requested output shape.
    pub format: OutputFormat,
}

impl ReportRequest {
    /// Build a request, rejecting a blank client identifier.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `client_id` is empty after trimming.
    pub fn new(
        client_id: impl Into<String>,
        range: DateRange,
        format: OutputFormat,
    ) -> Result<Self, TallyError> {
        let client_id = client_id.into().trim().to_string();
        if client_id.is_empty() {
            return Err(TallyError::InvalidArg(
                "client identifier must not be empty".into(),
            ));
        }
        Ok(Self {
            client_id,
            range,
            format,
        })
    }
}
