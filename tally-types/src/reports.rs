//! Job lifecycle models and report envelopes produced by the orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TallyError;
use crate::product::ProductType;
use crate::request::{CSV_MEDIA_TYPE, DateRange, JSON_MEDIA_TYPE, OutputFormat};

/// One report row: column name to JSON value, in upstream column order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Upstream-assigned job identifier. Opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wrap an upstream identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Local lifecycle phase of a job.
///
/// Transitions: `Submitted -> Polling -> Ready -> Downloaded`. `Failed` is
/// absorbing and reachable from `Polling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// Upstream accepted the job.
    Submitted,
    /// Waiting for upstream to finish.
    Polling,
    /// Upstream reports the payload as downloadable.
    Ready,
    /// Payload retrieved.
    Downloaded,
    /// Upstream failure or poll timeout.
    Failed,
}

impl JobPhase {
    /// True for phases no further transition leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Downloaded | Self::Failed)
    }
}

/// Upstream job state, reduced to the vocabulary the poll loop acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Queued, or an unrecognized non-terminal tag.
    Pending,
    /// Upstream is working on it.
    Running,
    /// Payload can be downloaded.
    Ready,
    /// Upstream gave up.
    Failed,
}

/// Status document returned by a status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Reduced state tag.
    pub state: JobState,
    /// Upstream tag as received, lowercased.
    pub raw_state: String,
    /// Download reference, when upstream supplies one.
    pub download_ref: Option<String>,
    /// Upstream message, typically set on failure.
    pub message: Option<String>,
    /// Full upstream document.
    pub raw: serde_json::Value,
}

/// A job as tracked by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportJob {
    /// Upstream identifier.
    pub id: JobId,
    /// Product the job reports on.
    pub product: ProductType,
    /// Reporting period.
    pub range: DateRange,
    /// Current phase.
    pub phase: JobPhase,
}

/// Downloaded bytes with the content type upstream declared.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawPayload {
    /// Body bytes.
    pub bytes: Vec<u8>,
    /// `Content-Type` header, if any.
    pub content_type: Option<String>,
}

impl RawPayload {
    /// Payload with a declared content type.
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: Some(content_type.into()),
        }
    }

    /// True if the declared content type names delimited text.
    #[must_use]
    pub fn is_csv(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("csv"))
    }
}

/// A finished job and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedJob {
    /// The job, in phase `Downloaded`.
    pub job: ReportJob,
    /// Raw upstream payload.
    pub payload: RawPayload,
}

/// A report encoded in one output shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "data", rename_all = "lowercase")]
pub enum RenderedReport {
    /// Cleaned rows.
    Json(Vec<Row>),
    /// Delimited text with a header line.
    Csv(String),
    /// Binary spreadsheet and its media type.
    Spreadsheet {
        /// Encoded document.
        bytes: Vec<u8>,
        /// Media type to declare alongside the bytes.
        media_type: String,
    },
}

impl RenderedReport {
    /// Shape of this report.
    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        match self {
            Self::Json(_) => OutputFormat::Json,
            Self::Csv(_) => OutputFormat::Csv,
            Self::Spreadsheet { .. } => OutputFormat::Spreadsheet,
        }
    }

    /// Media type to declare for this report.
    #[must_use]
    pub fn media_type(&self) -> &str {
        match self {
            Self::Json(_) => JSON_MEDIA_TYPE,
            Self::Csv(_) => CSV_MEDIA_TYPE,
            Self::Spreadsheet { media_type, .. } => media_type,
        }
    }
}

/// Result of one product pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReport {
    /// Upstream job identifier.
    pub job_id: JobId,
    /// Product reported on.
    pub product: ProductType,
    /// Terminal phase reached.
    pub phase: JobPhase,
    /// Rows surviving the filters.
    pub count: usize,
    /// Encoded rows.
    pub data: RenderedReport,
}

/// Per-product line in an aggregated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Product reported on.
    pub product: ProductType,
    /// Upstream job identifier.
    pub job_id: JobId,
    /// Rows the product contributed.
    pub count: usize,
}

/// A product excluded from an aggregated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFailure {
    /// Product that failed.
    pub product: ProductType,
    /// Why it failed.
    pub error: TallyError,
}

/// Merged result of several product pipelines.
///
/// `count` always equals the sum of the `products` counts. Failed products
/// contribute no rows and are listed in `failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Merged, provenance-tagged rows.
    pub data: RenderedReport,
    /// Total merged rows.
    pub count: usize,
    /// One entry per successful product, in request order.
    pub products: Vec<ProductSummary>,
    /// Successful products, in request order.
    pub succeeded: Vec<ProductType>,
    /// Excluded products with their errors.
    pub failed: Vec<ProductFailure>,
}

/// Unfiltered payload of an existing job, in a negotiated shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReport {
    /// Upstream job identifier.
    pub job_id: JobId,
    /// Rows in the payload.
    pub count: usize,
    /// Encoded rows.
    pub data: RenderedReport,
}
