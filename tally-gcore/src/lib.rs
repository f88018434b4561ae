//! tally-gcore
//!
//! Connector implementing `IdentityProvider` and `ReportingApi` over the Gcore
//! IAM and billing endpoints with `reqwest`.
//!
//! Error normalization:
//! - transport failures, timeouts and 5xx answers are `UpstreamUnavailable`
//! - 401/403 answers are `Auth`
//! - other 4xx answers are `UpstreamRejected` with the body kept verbatim
//! - 2xx answers that do not follow the expected document shape are `Protocol`
#![warn(missing_docs)]

mod builder;
mod documents;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Value, json};
use tally_core::connector::{IdentityProvider, ReportingApi, TallyConnector};
use tally_core::{
    Credential, DateRange, GcoreEndpoints, JobId, JobStatus, ProductType, RawPayload, TallyError,
    parse_status_document,
};
use url::Url;

pub use builder::GcoreConnectorBuilder;

/// `Accept` header sent when downloading a finished report.
pub const DOWNLOAD_ACCEPT: &str = "application/json, text/csv; q=0.9, */*; q=0.1";

/// Report template requested from upstream.
pub const REPORT_TEMPLATE: &str = "ResellerStatistics";

/// Public connector type. Construct with [`GcoreConnector::builder`].
pub struct GcoreConnector {
    http: reqwest::Client,
    endpoints: GcoreEndpoints,
    username: String,
    password: String,
    default_valid_for: Duration,
}

impl GcoreConnector {
    /// Stable connector name.
    pub const NAME: &'static str = "gcore";

    /// Start building a connector.
    #[must_use]
    pub fn builder() -> GcoreConnectorBuilder {
        GcoreConnectorBuilder::default()
    }

    /// Endpoint configuration in use.
    #[must_use]
    pub const fn endpoints(&self) -> &GcoreEndpoints {
        &self.endpoints
    }

    fn url(&self, path: &str, job_id: Option<&JobId>) -> Result<Url, TallyError> {
        let path = match job_id {
            Some(id) => {
                if id.as_str().is_empty() || id.as_str().contains(['/', '?', '#', ' ']) {
                    return Err(TallyError::InvalidArg(format!(
                        "job identifier '{id}' is not a valid path segment"
                    )));
                }
                path.replace("{uuid}", id.as_str())
            }
            None => path.to_string(),
        };
        let joined = format!("{}{}", self.endpoints.base_url.trim_end_matches('/'), path);
        Url::parse(&joined)
            .map_err(|e| TallyError::InvalidArg(format!("invalid upstream URL '{joined}': {e}")))
    }
}

fn transport_error(endpoint: &str, e: &reqwest::Error) -> TallyError {
    TallyError::UpstreamUnavailable {
        endpoint: endpoint.to_string(),
        status: e.status().map(|s| s.as_u16()),
        message: if e.is_timeout() {
            format!("request timed out: {e}")
        } else {
            e.to_string()
        },
    }
}

/// Pass 2xx answers through; map everything else onto the error taxonomy.
async fn checked(endpoint: &str, resp: reqwest::Response) -> Result<reqwest::Response, TallyError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let code = status.as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(match code {
        401 | 403 => TallyError::auth(format!("{endpoint} answered {code}: {body}")),
        400..=499 => TallyError::UpstreamRejected {
            endpoint: endpoint.to_string(),
            status: code,
            body,
        },
        _ => TallyError::UpstreamUnavailable {
            endpoint: endpoint.to_string(),
            status: Some(code),
            message: body,
        },
    })
}

async fn json_body(endpoint: &str, resp: reqwest::Response) -> Result<Value, TallyError> {
    let bytes = resp.bytes().await.map_err(|e| transport_error(endpoint, &e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| TallyError::protocol(endpoint, format!("body is not JSON: {e}")))
}

#[async_trait]
impl IdentityProvider for GcoreConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "tally_gcore::login", skip(self))
    )]
    async fn login(&self) -> Result<Credential, TallyError> {
        const EP: &str = "login";
        let url = self.url(&self.endpoints.auth_path, None)?;
        let resp = self
            .http
            .post(url)
            .json(&json!({"username": self.username, "password": self.password}))
            .send()
            .await
            .map_err(|e| transport_error(EP, &e))?;
        let status = resp.status();
        if status.is_client_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TallyError::auth(format!(
                "identity endpoint rejected the account ({}): {body}",
                status.as_u16()
            )));
        }
        let doc = json_body(EP, checked(EP, resp).await?).await?;
        documents::credential_from_login(&doc, self.default_valid_for)
    }
}

#[async_trait]
impl ReportingApi for GcoreConnector {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "tally_gcore::list_feature_ids", skip(self, credential))
    )]
    async fn list_feature_ids(
        &self,
        credential: &Credential,
        product: ProductType,
    ) -> Result<Vec<u64>, TallyError> {
        const EP: &str = "features";
        let resp = self
            .http
            .get(self.url(&self.endpoints.features_path, None)?)
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(|e| transport_error(EP, &e))?;
        let doc = json_body(EP, checked(EP, resp).await?).await?;
        let ids = documents::feature_ids_for(&doc, product)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(product = %product, count = ids.len(), "resolved feature ids");
        Ok(ids)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tally_gcore::submit_job",
            skip(self, credential, feature_ids),
            fields(features = feature_ids.len(), start = %range.start(), end = %range.end()),
        )
    )]
    async fn submit_job(
        &self,
        credential: &Credential,
        feature_ids: &[u64],
        range: &DateRange,
    ) -> Result<JobId, TallyError> {
        const EP: &str = "generate";
        let payload = json!({
            "template_code": REPORT_TEMPLATE,
            "parameters": {
                "date_from": range.start().format("%Y-%m-%d").to_string(),
                "date_to": range.end().format("%Y-%m-%d").to_string(),
                "group_by": ["client"],
                "features": feature_ids,
            }
        });
        let resp = self
            .http
            .post(self.url(&self.endpoints.generate_path, None)?)
            .bearer_auth(credential.token())
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error(EP, &e))?;
        let doc = json_body(EP, checked(EP, resp).await?).await?;
        documents::job_id_from_submission(&doc)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "tally_gcore::get_status", skip(self, credential), fields(job_id = %job_id))
    )]
    async fn get_status(
        &self,
        credential: &Credential,
        job_id: &JobId,
    ) -> Result<JobStatus, TallyError> {
        const EP: &str = "status";
        let resp = self
            .http
            .get(self.url(&self.endpoints.status_path, Some(job_id))?)
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(|e| transport_error(EP, &e))?;
        let doc = json_body(EP, checked(EP, resp).await?).await?;
        parse_status_document(EP, doc)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "tally_gcore::download", skip(self, credential), fields(job_id = %job_id))
    )]
    async fn download(
        &self,
        credential: &Credential,
        job_id: &JobId,
    ) -> Result<RawPayload, TallyError> {
        const EP: &str = "download";
        let resp = self
            .http
            .get(self.url(&self.endpoints.download_path, Some(job_id))?)
            .bearer_auth(credential.token())
            .header(ACCEPT, DOWNLOAD_ACCEPT)
            .send()
            .await
            .map_err(|e| transport_error(EP, &e))?;
        let resp = checked(EP, resp).await?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await.map_err(|e| transport_error(EP, &e))?;
        #[cfg(feature = "tracing")]
        tracing::debug!(size = bytes.len(), content_type = ?content_type, "downloaded report");
        Ok(RawPayload {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

impl TallyConnector for GcoreConnector {
    fn name(&self) -> &'static str {
        Self::NAME
    }
}
