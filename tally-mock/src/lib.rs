//! tally-mock
//!
//! Deterministic upstreams for tests and examples.
//!
//! - [`MockConnector`] answers every call from static fixtures: login always
//!   succeeds, every job is immediately ready and downloads return the
//!   [`fixtures`] payload of the job's product.
//! - [`dynamic::ScriptedConnector`] starts from the same fixture behavior but
//!   lets a test script each call (return, fail, delay, hang) and inspect the
//!   calls made.

use std::time::Duration;

use async_trait::async_trait;
use tally_core::connector::{IdentityProvider, ReportingApi, TallyConnector};
use tally_core::{
    Credential, DateRange, JobId, JobStatus, ProductType, RawPayload, TallyError,
    classify_state,
};

pub mod dynamic;
pub mod fixtures;

pub use dynamic::{MockBehavior, ScriptedConnector, ScriptedController};

/// Token every credential issued by [`MockConnector`] carries.
pub const MOCK_TOKEN: &str = "mock-token";

/// Lifetime of mock credentials.
pub const MOCK_VALID_FOR: Duration = Duration::from_secs(1800);

/// Mock connector for CI-safe examples. Provides deterministic data from static fixtures.
pub struct MockConnector;

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn check_token(credential: &Credential) -> Result<(), TallyError> {
        if credential.token().starts_with(MOCK_TOKEN) {
            Ok(())
        } else {
            Err(TallyError::auth("mock upstream rejected the bearer token"))
        }
    }
}

/// Status document carrying `tag`, as upstream would report it.
#[must_use]
pub fn status(tag: &str) -> JobStatus {
    JobStatus {
        state: classify_state(tag),
        raw_state: tag.to_ascii_lowercase(),
        download_ref: None,
        message: None,
        raw: serde_json::json!({ "status": tag }),
    }
}

/// Failed status document with an upstream reason.
#[must_use]
pub fn failed_status(message: &str) -> JobStatus {
    let mut st = status("failed");
    st.message = Some(message.to_string());
    st.raw = serde_json::json!({ "status": "failed", "message": message });
    st
}

pub(crate) fn submit_for(feature_ids: &[u64]) -> Result<JobId, TallyError> {
    feature_ids
        .first()
        .and_then(|id| fixtures::product_for_feature(*id))
        .map(fixtures::job_id)
        .ok_or_else(|| TallyError::UpstreamRejected {
            endpoint: "generate".into(),
            status: 422,
            body: r#"{"detail":"unknown features"}"#.into(),
        })
}

pub(crate) fn download_for(job_id: &JobId) -> Result<RawPayload, TallyError> {
    fixtures::product_for_job(job_id)
        .map(fixtures::payload)
        .ok_or_else(|| TallyError::UpstreamRejected {
            endpoint: "download".into(),
            status: 404,
            body: format!(r#"{{"detail":"no report {job_id}"}}"#),
        })
}

#[async_trait]
impl IdentityProvider for MockConnector {
    async fn login(&self) -> Result<Credential, TallyError> {
        Ok(Credential::issued_now(MOCK_TOKEN, MOCK_VALID_FOR))
    }
}

#[async_trait]
impl ReportingApi for MockConnector {
    async fn list_feature_ids(
        &self,
        credential: &Credential,
        product: ProductType,
    ) -> Result<Vec<u64>, TallyError> {
        Self::check_token(credential)?;
        Ok(fixtures::feature_ids(product))
    }

    async fn submit_job(
        &self,
        credential: &Credential,
        feature_ids: &[u64],
        _range: &DateRange,
    ) -> Result<JobId, TallyError> {
        Self::check_token(credential)?;
        submit_for(feature_ids)
    }

    async fn get_status(
        &self,
        credential: &Credential,
        job_id: &JobId,
    ) -> Result<JobStatus, TallyError> {
        Self::check_token(credential)?;
        fixtures::product_for_job(job_id)
            .map(|_| status("ready"))
            .ok_or_else(|| TallyError::UpstreamRejected {
                endpoint: "status".into(),
                status: 404,
                body: format!(r#"{{"detail":"no report {job_id}"}}"#),
            })
    }

    async fn download(
        &self,
        credential: &Credential,
        job_id: &JobId,
    ) -> Result<RawPayload, TallyError> {
        Self::check_token(credential)?;
        download_for(job_id)
    }
}

impl TallyConnector for MockConnector {
    fn name(&self) -> &'static str {
        "tally-mock"
    }
}
