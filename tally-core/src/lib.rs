//! tally-core
//!
//! Core types, traits, and the data transform shared across the tally workspace.
//!
//! - `types`: re-exports of the `tally-types` data model.
//! - `connector`: upstream role traits (`IdentityProvider`, `ReportingApi`) and
//!   the combined `TallyConnector`.
//! - `credential`: the bearer `Credential` and its validity rules.
//! - `status`: reduction of upstream status documents to `JobStatus`.
//! - `table`: normalization of raw payloads into a `Table`.
//! - `transform`: row/metric filters, pruning, provenance tagging and encoders.
//!
//! The transform is synchronous and allocation-bound; nothing in it performs I/O.
#![warn(missing_docs)]

/// Upstream role traits and the combined connector interface.
pub mod connector;
/// Bearer credential issued by the identity endpoint.
pub mod credential;
/// Status vocabulary and status document parsing.
pub mod status;
/// Normalized tabular payloads.
pub mod table;
/// Filtering, cleaning, tagging and encoding of report tables.
pub mod transform;
pub mod types;

pub use connector::{IdentityProvider, ReportingApi, TallyConnector};
pub use credential::Credential;
pub use status::{classify_state, parse_status_document};
pub use table::Table;
pub use transform::{ReportTransform, TransformOptions};
pub use types::*;
