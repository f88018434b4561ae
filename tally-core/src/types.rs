//! Re-export of foundational types from `tally-types`.
// Consolidated re-exports so downstream crates can depend on `tally-core` only

pub use tally_types::{
    AggregateMode, CredentialConfig, GcoreEndpoints, ProvenancePolicy, SpreadsheetPolicy,
    TallyConfig,
};
pub use tally_types::{
    AggregateReport, DownloadedJob, JobId, JobPhase, JobState, JobStatus, ProductFailure,
    ProductReport, ProductSummary, RawPayload, RawReport, RenderedReport, ReportJob, Row,
};
pub use tally_types::{
    CSV_MEDIA_TYPE, DateRange, JSON_MEDIA_TYPE, OutputFormat, ReportRequest, XLSX_MEDIA_TYPE,
};
pub use tally_types::{ProductType, TallyError};
