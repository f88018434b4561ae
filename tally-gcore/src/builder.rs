use std::time::Duration;

use tally_core::{CredentialConfig, GcoreEndpoints, TallyError};

use crate::GcoreConnector;

/// Builder for [`GcoreConnector`].
#[derive(Clone)]
pub struct GcoreConnectorBuilder {
    endpoints: GcoreEndpoints,
    username: String,
    password: String,
    default_valid_for: Duration,
    request_timeout: Duration,
    http: Option<reqwest::Client>,
}

impl Default for GcoreConnectorBuilder {
    fn default() -> Self {
        Self {
            endpoints: GcoreEndpoints::default(),
            username: String::new(),
            password: String::new(),
            default_valid_for: Duration::from_secs(1800),
            request_timeout: Duration::from_secs(30),
            http: None,
        }
    }
}

impl GcoreConnectorBuilder {
    /// Base URL and path templates.
    #[must_use]
    pub fn endpoints(mut self, endpoints: GcoreEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Account secret and default credential lifetime.
    #[must_use]
    pub fn credentials(mut self, cfg: &CredentialConfig) -> Self {
        self.username.clone_from(&cfg.username);
        self.password.clone_from(&cfg.password);
        self.default_valid_for = cfg.valid_for;
        self
    }

    /// Per-request timeout of the internal HTTP client.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Use a caller-supplied HTTP client; `request_timeout` is then the caller's concern.
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Finish the connector.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the account name is empty, the base URL does not
    /// parse, or the HTTP client cannot be built.
    pub fn build(self) -> Result<GcoreConnector, TallyError> {
        if self.username.trim().is_empty() {
            return Err(TallyError::InvalidArg("upstream username is required".into()));
        }
        url::Url::parse(&self.endpoints.base_url).map_err(|e| {
            TallyError::InvalidArg(format!("invalid base URL '{}': {e}", self.endpoints.base_url))
        })?;
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .timeout(self.request_timeout)
                .build()
                .map_err(|e| TallyError::InvalidArg(format!("cannot build HTTP client: {e}")))?,
        };
        Ok(GcoreConnector {
            http,
            endpoints: self.endpoints,
            username: self.username,
            password: self.password,
            default_valid_for: self.default_valid_for,
        })
    }
}
