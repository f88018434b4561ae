use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the tally workspace.
///
/// Variants mirror the failure classes of a report pipeline: credential problems,
/// upstream transport and protocol failures, job lifecycle failures, and
/// payload reshaping failures.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TallyError {
    /// The identity endpoint rejected the account secret, was unreachable after
    /// the configured attempts, or an upstream call answered 401/403.
    #[error("authentication failed: {message}")]
    Auth {
        /// Human-readable reason.
        message: String,
    },

    /// Network failure, request timeout, or a 5xx answer from upstream.
    #[error("upstream unavailable at {endpoint}: {message}")]
    UpstreamUnavailable {
        /// Logical endpoint label (e.g. "status").
        endpoint: String,
        /// HTTP status if a response was received.
        status: Option<u16>,
        /// Transport error text or response body.
        message: String,
    },

    /// Upstream answered with a 4xx other than an authentication failure.
    #[error("upstream rejected {endpoint} request ({status}): {body}")]
    UpstreamRejected {
        /// Logical endpoint label (e.g. "generate").
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// Upstream answered with a document that does not follow the expected shape.
    #[error("malformed {endpoint} response: {message}")]
    Protocol {
        /// Logical endpoint label.
        endpoint: String,
        /// What was missing or malformed.
        message: String,
    },

    /// No billing feature identifiers are known for the product.
    #[error("no features configured for product {product}")]
    NoFeaturesConfigured {
        /// Product label (e.g. "CLOUD").
        product: String,
    },

    /// Upstream marked the job as failed.
    #[error("report {job_id} failed upstream: {message}")]
    ReportGenerationFailed {
        /// Upstream job identifier.
        job_id: String,
        /// Upstream-supplied reason, if any.
        message: String,
    },

    /// The poll loop exceeded its wall-clock ceiling.
    #[error("report {job_id} not ready after {elapsed_ms}ms (last state: {last_state})")]
    ReportTimeout {
        /// Upstream job identifier.
        job_id: String,
        /// Elapsed time when the loop gave up.
        elapsed_ms: u64,
        /// Last state tag observed, or "unknown".
        last_state: String,
    },

    /// The payload schema lacks a field the pipeline is configured to use.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The payload is not in a recognizable tabular shape, or encoding failed.
    #[error("transform error: {0}")]
    Transform(String),

    /// Invalid caller input.
    #[error("invalid argument: {0}")]
    InvalidArg(String),
}

impl TallyError {
    /// Helper: build an `Auth` error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Helper: build an `UpstreamUnavailable` error without a response status.
    pub fn unavailable(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            endpoint: endpoint.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Helper: build a `Protocol` error.
    pub fn protocol(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Helper: build a `Transform` error.
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform(message.into())
    }

    /// Returns true for failures worth retrying on the next poll tick.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }

    /// Returns true if the error means the credential is unusable.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Short, stable name of the variant for diagnostics and API payloads.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth_error",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::UpstreamRejected { .. } => "upstream_rejected",
            Self::Protocol { .. } => "protocol_error",
            Self::NoFeaturesConfigured { .. } => "no_features_configured",
            Self::ReportGenerationFailed { .. } => "report_generation_failed",
            Self::ReportTimeout { .. } => "report_timeout",
            Self::Configuration(_) => "configuration_error",
            Self::Transform(_) => "transform_error",
            Self::InvalidArg(_) => "invalid_argument",
        }
    }
}
