//! Request and response bodies of the HTTP surface.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

use tally::{
    AggregateReport, DateRange, OutputFormat, ProductSummary, ProductType, RenderedReport,
    ReportRequest, TallyError,
};

/// Body of the report generation endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportBody {
    /// Client identifier; upstream sends it as a number, callers often as text.
    #[serde(deserialize_with = "string_or_number")]
    pub gcore_user_id: String,
    /// First day, `YYYY-MM-DD`.
    pub start_date: String,
    /// Last day, `YYYY-MM-DD`.
    pub end_date: String,
    /// `json`, `csv` or `excel`.
    #[serde(default)]
    pub format: Option<String>,
}

impl ReportBody {
    /// Validate the body and negotiate the output format against `accept`.
    ///
    /// # Errors
    /// `InvalidArg` for a blank client, malformed or inverted dates, or an
    /// unknown format.
    pub fn into_request(self, accept: Option<&str>) -> Result<ReportRequest, TallyError> {
        let range = DateRange::parse(&self.start_date, &self.end_date)?;
        let format = negotiate(accept, self.format.as_deref())?;
        ReportRequest::new(self.gcore_user_id, range, format)
    }
}

/// Optional format selector of the job endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatBody {
    /// `json`, `csv` or `excel`.
    #[serde(default)]
    pub format: Option<String>,
}

/// Resolve the output format from the `Accept` header and a body or query value.
///
/// # Errors
/// `InvalidArg` for an unknown format name.
pub fn negotiate(accept: Option<&str>, requested: Option<&str>) -> Result<OutputFormat, TallyError> {
    let body = requested.map(OutputFormat::from_str).transpose()?;
    Ok(OutputFormat::negotiate(accept, body))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Response of a single-product report or a job download.
#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    /// Upstream job identifier.
    pub uuid: String,
    /// `completed`, or the upstream state tag while a job is unfinished.
    pub status: String,
    /// Rows in `data`.
    pub count: usize,
    /// Rows, delimited text, or a spreadsheet envelope.
    pub data: Value,
}

impl ReportResponse {
    /// A finished report.
    pub fn completed(uuid: impl Into<String>, count: usize, data: &RenderedReport) -> Self {
        Self {
            uuid: uuid.into(),
            status: "completed".to_string(),
            count,
            data: render_data(data),
        }
    }

    /// A job upstream has not finished yet.
    pub fn unfinished(uuid: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            status: status.into(),
            count: 0,
            data: Value::Array(Vec::new()),
        }
    }
}

/// One product missing from an aggregated response.
#[derive(Debug, Clone, Serialize)]
pub struct FailedProduct {
    /// Product label.
    pub product: ProductType,
    /// Error message.
    pub detail: String,
    /// Error kind, as in error responses.
    pub kind: &'static str,
}

/// Response of the aggregated report endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResponse {
    /// Always `aggregated`.
    pub uuid: String,
    /// Always `completed`.
    pub status: String,
    /// Merged rows.
    pub count: usize,
    /// Merged rows, delimited text, or a spreadsheet envelope.
    pub data: Value,
    /// Per-product contribution.
    pub products: Vec<ProductSummary>,
    /// Products that contributed.
    pub succeeded: Vec<ProductType>,
    /// Products that did not.
    pub failed: Vec<FailedProduct>,
}

impl From<AggregateReport> for AggregateResponse {
    fn from(report: AggregateReport) -> Self {
        Self {
            uuid: "aggregated".to_string(),
            status: "completed".to_string(),
            count: report.count,
            data: render_data(&report.data),
            products: report.products,
            succeeded: report.succeeded,
            failed: report
                .failed
                .into_iter()
                .map(|f| FailedProduct {
                    product: f.product,
                    detail: f.error.to_string(),
                    kind: f.error.kind(),
                })
                .collect(),
        }
    }
}

/// Liveness document.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `healthy`.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// RFC 3339 timestamp of the check.
    pub timestamp: String,
}

impl HealthResponse {
    /// A healthy response stamped now.
    #[must_use]
    pub fn now() -> Self {
        Self {
            status: "healthy",
            service: "tally-server",
            version: env!("CARGO_PKG_VERSION"),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// JSON value carried in the `data` field for each output shape.
///
/// Rows stay an array, delimited text a string. Spreadsheets travel as a
/// base64 envelope that names their media type.
#[must_use]
pub fn render_data(report: &RenderedReport) -> Value {
    match report {
        RenderedReport::Json(rows) => Value::Array(rows.iter().cloned().map(Value::Object).collect()),
        RenderedReport::Csv(text) => Value::String(text.clone()),
        RenderedReport::Spreadsheet { bytes, media_type } => json!({
            "content_type": media_type,
            "data": STANDARD.encode(bytes),
            "size_bytes": bytes.len(),
            "format": "excel",
            "note": "base64 encoded; decode to obtain the file",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally::Row;

    #[test]
    fn client_id_accepts_text_and_numbers() {
        let body: ReportBody = serde_json::from_value(json!({
            "gcore_user_id": 829449,
            "start_date": "2025-09-01",
            "end_date": "2025-09-24",
        }))
        .unwrap();
        assert_eq!(body.gcore_user_id, "829449");
        assert_eq!(body.format, None);

        let body: ReportBody = serde_json::from_value(json!({
            "gcore_user_id": "829449",
            "start_date": "2025-09-01",
            "end_date": "2025-09-24",
            "format": "csv",
        }))
        .unwrap();
        let req = body.into_request(None).unwrap();
        assert_eq!(req.client_id, "829449");
        assert_eq!(req.format, OutputFormat::Csv);
    }

    #[test]
    fn non_json_accept_header_overrides_body_format() {
        let accept = Some("text/csv");
        assert_eq!(negotiate(accept, Some("json")).unwrap(), OutputFormat::Csv);
        assert_eq!(
            negotiate(Some("application/json"), Some("excel")).unwrap(),
            OutputFormat::Spreadsheet
        );
        assert_eq!(negotiate(None, None).unwrap(), OutputFormat::Json);
        assert_eq!(negotiate(None, Some("pdf")).unwrap_err().kind(), "invalid_argument");
    }

    #[test]
    fn inverted_range_is_rejected() {
        let body = ReportBody {
            gcore_user_id: "1".into(),
            start_date: "2025-09-24".into(),
            end_date: "2025-09-01".into(),
            format: None,
        };
        assert_eq!(body.into_request(None).unwrap_err().kind(), "invalid_argument");
    }

    #[test]
    fn spreadsheet_travels_as_base64_envelope() {
        let data = render_data(&RenderedReport::Spreadsheet {
            bytes: b"PK\x03\x04".to_vec(),
            media_type: tally_core::XLSX_MEDIA_TYPE.to_string(),
        });
        assert_eq!(data["content_type"], tally_core::XLSX_MEDIA_TYPE);
        assert_eq!(data["data"], "UEsDBA==");
        assert_eq!(data["size_bytes"], 4);
        assert_eq!(data["format"], "excel");
    }

    #[test]
    fn rows_stay_an_array() {
        let mut row = Row::new();
        row.insert("Feature".into(), json!("Traffic"));
        let data = render_data(&RenderedReport::Json(vec![row]));
        assert_eq!(data, json!([{"Feature": "Traffic"}]));
    }
}
