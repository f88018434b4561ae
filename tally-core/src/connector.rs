use async_trait::async_trait;

use crate::credential::Credential;
use crate::{DateRange, JobId, JobStatus, ProductType, RawPayload, TallyError};

/// Focused role trait for connectors that can obtain a bearer credential.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange the configured account secret for a fresh credential.
    ///
    /// # Errors
    /// `Auth` if the secret is rejected, `UpstreamUnavailable` if the identity
    /// endpoint cannot be reached.
    async fn login(&self) -> Result<Credential, TallyError>;
}

/// Focused role trait for the billing report endpoints.
///
/// Every call is given a credential the caller believes to be valid. A 401/403
/// answer must surface as `TallyError::Auth` so the caller can discard it.
#[async_trait]
pub trait ReportingApi: Send + Sync {
    /// Billing feature identifiers belonging to `product`, sorted and deduplicated.
    ///
    /// An empty list is a valid answer; the orchestrator decides what it means.
    async fn list_feature_ids(
        &self,
        credential: &Credential,
        product: ProductType,
    ) -> Result<Vec<u64>, TallyError>;

    /// Start generation of a client-grouped usage report.
    async fn submit_job(
        &self,
        credential: &Credential,
        feature_ids: &[u64],
        range: &DateRange,
    ) -> Result<JobId, TallyError>;

    /// Query the current state of a job.
    ///
    /// # Errors
    /// `Protocol` if the document carries no state tag.
    async fn get_status(
        &self,
        credential: &Credential,
        job_id: &JobId,
    ) -> Result<JobStatus, TallyError>;

    /// Retrieve the finished payload of a job.
    async fn download(
        &self,
        credential: &Credential,
        job_id: &JobId,
    ) -> Result<RawPayload, TallyError>;
}

/// A complete upstream: identity plus reporting.
pub trait TallyConnector: IdentityProvider + ReportingApi {
    /// Stable identifier for logs and diagnostics (e.g. "gcore").
    fn name(&self) -> &'static str;
}
