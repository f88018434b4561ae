//! Tally drives usage-report jobs on the Gcore billing API and reshapes the
//! results for one client.
//!
//! Overview
//! - Submits an asynchronous report job per product, polls it at a fixed
//!   interval until it is ready, and downloads the payload.
//! - Filters the payload to one client's rows with a non-zero metric, prunes
//!   empty values from JSON rows, and encodes JSON, delimited text or a
//!   spreadsheet.
//! - Merges several products into one provenance-tagged report, tolerating
//!   per-product failures.
//! - Shares one bearer credential across all calls through
//!   [`tally_middleware::CredentialCache`].
//!
//! Key behaviors and trade-offs
//! - Poll loop: transient status failures are retried on the next tick under the
//!   same ceiling; a malformed status aborts. The ceiling is checked every tick.
//! - Aggregation: `Concurrent` (default) runs products side by side and is
//!   bounded by the slowest; `Sequential` issues fewer simultaneous upstream
//!   jobs. Authentication failures abort the whole aggregate.
//! - Provenance: `PreserveUpstream` (default) never overwrites an upstream
//!   column; `Overwrite` keeps the column name stable.
//!
//! Examples
//! Building an orchestrator and requesting one product:
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally::{OutputFormat, ProductType, ReportRequest, Tally, DateRange};
//!
//! let tally = Tally::builder()
//!     .with_connector(Arc::new(tally_mock::MockConnector::new()))
//!     .build()?;
//! let request = ReportRequest::new(
//!     "829449",
//!     DateRange::parse("2025-09-01", "2025-09-24")?,
//!     OutputFormat::Csv,
//! )?;
//! let report = tally.generate(ProductType::Cloud, &request).await?;
//! ```
//!
//! Aggregating every product:
//! ```rust,ignore
//! let all = tally.aggregate(request).run().await?;
//! for failure in &all.failed {
//!     eprintln!("{} excluded: {}", failure.product, failure.error);
//! }
//! ```
//!
//! See `tally/examples/` for runnable end-to-end demonstrations.
#![warn(missing_docs)]

pub(crate) mod core;
mod pipeline;

pub use core::{Tally, TallyBuilder};
pub use pipeline::aggregate::AggregateBuilder;

pub use tally_middleware::{CredentialCache, CredentialStats, UpstreamSession};

// Re-export core types for convenience
pub use tally_core::{
    AggregateMode, AggregateReport, CredentialConfig, DateRange, DownloadedJob, JobId, JobPhase,
    JobState, JobStatus, OutputFormat, ProductFailure, ProductReport, ProductSummary, ProductType,
    ProvenancePolicy, RawPayload, RawReport, RenderedReport, ReportJob, ReportRequest, Row,
    SpreadsheetPolicy, TallyConfig, TallyError,
};
