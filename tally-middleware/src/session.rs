//! Authenticated, timeout-bounded access to the reporting endpoints.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tally_core::connector::{ReportingApi, TallyConnector};
use tally_core::{Credential, DateRange, JobId, JobStatus, ProductType, RawPayload, TallyError};

use crate::credential::CredentialCache;

/// Reporting calls bound to a credential cache.
///
/// Each call fetches a valid credential, runs under `request_timeout`, and on
/// an `Auth` answer invalidates the credential and retries exactly once.
#[derive(Clone)]
pub struct UpstreamSession {
    api: Arc<dyn ReportingApi>,
    credentials: Arc<CredentialCache>,
    request_timeout: Duration,
    name: &'static str,
}

impl UpstreamSession {
    /// Build a session over `connector`, sharing `credentials`.
    pub fn new<C>(connector: Arc<C>, credentials: Arc<CredentialCache>, request_timeout: Duration) -> Self
    where
        C: TallyConnector + 'static,
    {
        let name = connector.name();
        Self::from_api(connector, name, credentials, request_timeout)
    }

    /// Build a session over an already type-erased reporting API.
    pub fn from_api(
        api: Arc<dyn ReportingApi>,
        name: &'static str,
        credentials: Arc<CredentialCache>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            api,
            credentials,
            request_timeout,
            name,
        }
    }

    /// Per-call timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Connector name, for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The shared credential cache.
    #[must_use]
    pub const fn credentials(&self) -> &Arc<CredentialCache> {
        &self.credentials
    }

    async fn call<T, F, Fut>(&self, endpoint: &'static str, op: F) -> Result<T, TallyError>
    where
        F: Fn(Credential) -> Fut,
        Fut: Future<Output = Result<T, TallyError>>,
    {
        let mut retried = false;
        loop {
            let credential = self.credentials.get_valid_credential().await?;
            let outcome = tokio::time::timeout(self.request_timeout, op(credential))
                .await
                .unwrap_or_else(|_| {
                    Err(TallyError::unavailable(
                        endpoint,
                        format!("no answer within {}ms", self.request_timeout.as_millis()),
                    ))
                });
            match outcome {
                Err(e) if e.is_auth() && !retried => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        connector = self.name,
                        endpoint,
                        "credential rejected; refreshing and retrying once"
                    );
                    self.credentials.invalidate().await;
                    retried = true;
                }
                Err(e) if e.is_auth() => {
                    self.credentials.invalidate().await;
                    return Err(e);
                }
                other => return other,
            }
        }
    }

    /// See [`ReportingApi::list_feature_ids`].
    ///
    /// # Errors
    /// Propagates credential and upstream failures.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "tally::session::list_feature_ids", skip(self), fields(connector = self.name))
    )]
    pub async fn list_feature_ids(&self, product: ProductType) -> Result<Vec<u64>, TallyError> {
        let api = &self.api;
        self.call("features", |cred| async move {
            api.list_feature_ids(&cred, product).await
        })
        .await
    }

    /// See [`ReportingApi::submit_job`].
    ///
    /// # Errors
    /// Propagates credential and upstream failures.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tally::session::submit_job",
            skip(self, feature_ids),
            fields(connector = self.name, features = feature_ids.len()),
        )
    )]
    pub async fn submit_job(
        &self,
        feature_ids: &[u64],
        range: &DateRange,
    ) -> Result<JobId, TallyError> {
        let api = &self.api;
        self.call("generate", |cred| async move {
            api.submit_job(&cred, feature_ids, range).await
        })
        .await
    }

    /// See [`ReportingApi::get_status`].
    ///
    /// # Errors
    /// Propagates credential and upstream failures.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "tally::session::get_status", skip(self), fields(connector = self.name, job_id = %job_id))
    )]
    pub async fn get_status(&self, job_id: &JobId) -> Result<JobStatus, TallyError> {
        let api = &self.api;
        self.call("status", |cred| async move { api.get_status(&cred, job_id).await })
            .await
    }

    /// See [`ReportingApi::download`].
    ///
    /// # Errors
    /// Propagates credential and upstream failures.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "tally::session::download", skip(self), fields(connector = self.name, job_id = %job_id))
    )]
    pub async fn download(&self, job_id: &JobId) -> Result<RawPayload, TallyError> {
        let api = &self.api;
        self.call("download", |cred| async move { api.download(&cred, job_id).await })
            .await
    }
}
