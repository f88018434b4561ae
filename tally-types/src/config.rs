//! Configuration types shared across the orchestrator, middleware and connectors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the spreadsheet output shape is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpreadsheetPolicy {
    /// Transcode the delimited grid into an Office Open XML workbook.
    #[default]
    Xlsx,
    /// Carry the delimited-text bytes unchanged, labelled `text/csv`.
    DelimitedText,
}

/// What happens when an upstream row already carries the provenance column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProvenancePolicy {
    /// Keep the upstream value and write provenance under `<column>_source`,
    /// suffixed `_2`, `_3`, ... until the name is free.
    #[default]
    PreserveUpstream,
    /// Replace the upstream value with the provenance label.
    Overwrite,
}

/// Whether aggregated products run side by side or one after another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AggregateMode {
    /// Run every product pipeline concurrently.
    #[default]
    Concurrent,
    /// Run product pipelines in request order, one at a time.
    Sequential,
}

/// Global configuration for the `Tally` orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyConfig {
    /// Delay between consecutive status queries for one job.
    pub poll_interval: Duration,
    /// Wall-clock ceiling for a job to reach a terminal state.
    pub poll_timeout: Duration,
    /// Upper bound for any single upstream call.
    pub request_timeout: Duration,
    /// Spreadsheet encoding.
    pub spreadsheet: SpreadsheetPolicy,
    /// Provenance collision handling during aggregation.
    pub provenance: ProvenancePolicy,
    /// Name of the column that records the source product of aggregated rows.
    pub provenance_column: String,
    /// Aggregation scheduling.
    pub aggregate_mode: AggregateMode,
    /// Also strip numeric zero fields from JSON rows.
    pub drop_zero_fields: bool,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            poll_timeout: Duration::from_secs(600),
            request_timeout: Duration::from_secs(30),
            spreadsheet: SpreadsheetPolicy::default(),
            provenance: ProvenancePolicy::default(),
            provenance_column: "Product".to_string(),
            aggregate_mode: AggregateMode::default(),
            drop_zero_fields: false,
        }
    }
}

/// Account secret and lifetime settings for the credential cache.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Account name sent to the identity endpoint.
    pub username: String,
    /// Account password sent to the identity endpoint.
    pub password: String,
    /// Validity assumed when the identity response omits `expires_in`.
    pub valid_for: Duration,
    /// A credential is treated as stale this long before its hard expiry.
    pub refresh_skew: Duration,
    /// Login attempts before giving up on an unreachable identity endpoint.
    pub login_attempts: u32,
    /// Fixed pause between login attempts.
    pub login_retry_delay: Duration,
}

impl CredentialConfig {
    /// Settings for the given account with default lifetimes.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            valid_for: Duration::from_secs(1800),
            refresh_skew: Duration::from_secs(60),
            login_attempts: 3,
            login_retry_delay: Duration::from_millis(500),
        }
    }
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("valid_for", &self.valid_for)
            .field("refresh_skew", &self.refresh_skew)
            .field("login_attempts", &self.login_attempts)
            .field("login_retry_delay", &self.login_retry_delay)
            .finish()
    }
}

/// Base URL and path templates of the upstream API.
///
/// Paths containing `{uuid}` have the job identifier substituted per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcoreEndpoints {
    /// Scheme and host, e.g. `https://api.gcore.com`.
    pub base_url: String,
    /// Identity (login) path.
    pub auth_path: String,
    /// Feature listing path.
    pub features_path: String,
    /// Report submission path.
    pub generate_path: String,
    /// Job status path template.
    pub status_path: String,
    /// Job download path template.
    pub download_path: String,
}

impl Default for GcoreEndpoints {
    fn default() -> Self {
        Self {
            base_url: "https://api.gcore.com".to_string(),
            auth_path: "/iam/auth/jwt/login".to_string(),
            features_path: "/billing/v3/report_features".to_string(),
            generate_path: "/billing/v1/org/files/report".to_string(),
            status_path: "/billing/v1/org/files/{uuid}".to_string(),
            download_path: "/billing/v1/org/files/{uuid}/download".to_string(),
        }
    }
}

impl GcoreEndpoints {
    /// Endpoints rooted at `base_url` with the default paths.
    #[must_use]
    pub fn with_base(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}
