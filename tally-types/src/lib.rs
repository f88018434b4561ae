//! Tally data transfer objects: the error taxonomy, product types, request
//! primitives, configuration and report envelopes shared by every crate in the
//! workspace.
#![warn(missing_docs)]

mod config;
mod error;
mod product;
mod reports;
mod request;

pub use config::{
    AggregateMode, CredentialConfig, GcoreEndpoints, ProvenancePolicy, SpreadsheetPolicy,
    TallyConfig,
};
pub use error::TallyError;
pub use product::ProductType;
pub use reports::{
    AggregateReport, DownloadedJob, JobId, JobPhase, JobState, JobStatus, ProductFailure,
    ProductReport, ProductSummary, RawPayload, RawReport, RenderedReport, ReportJob, Row,
};
pub use request::{
    CSV_MEDIA_TYPE, DateRange, JSON_MEDIA_TYPE, OutputFormat, ReportRequest, XLSX_MEDIA_TYPE,
};
