use std::sync::Arc;
use std::time::Duration;

use tally_core::connector::{IdentityProvider, ReportingApi, TallyConnector};
use tally_core::transform::ReportTransform;
use tally_core::{
    AggregateMode, CredentialConfig, ProvenancePolicy, SpreadsheetPolicy, TallyConfig, TallyError,
};
use tally_middleware::{CredentialCache, UpstreamSession};

/// Orchestrator that drives report jobs through their lifecycle and reshapes
/// the downloaded payloads.
pub struct Tally {
    pub(crate) session: UpstreamSession,
    pub(crate) cfg: TallyConfig,
}

struct Upstream {
    identity: Arc<dyn IdentityProvider>,
    api: Arc<dyn ReportingApi>,
    name: &'static str,
}

/// Builder for constructing a `Tally` orchestrator with custom configuration.
pub struct TallyBuilder {
    upstream: Option<Upstream>,
    credentials: CredentialConfig,
    shared_cache: Option<Arc<CredentialCache>>,
    cfg: TallyConfig,
}

impl Default for TallyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TallyBuilder {
    /// Create a new builder with the default configuration.
    ///
    /// Behavior and trade-offs:
    /// - Starts with no connector; you must register one via [`Self::with_connector`].
    /// - Defaults follow the upstream's pace: 10s poll interval, 600s poll
    ///   ceiling, 30s per-call timeout, xlsx spreadsheets, provenance column
    ///   `Product` with upstream values preserved on collision.
    #[must_use]
    pub fn new() -> Self {
        Self {
            upstream: None,
            credentials: CredentialConfig::new(String::new(), String::new()),
            shared_cache: None,
            cfg: TallyConfig::default(),
        }
    }

    /// Register the upstream connector.
    ///
    /// Registering a second connector replaces the first.
    #[must_use]
    pub fn with_connector<C>(mut self, connector: Arc<C>) -> Self
    where
        C: TallyConnector + 'static,
    {
        let name = connector.name();
        self.upstream = Some(Upstream {
            identity: Arc::clone(&connector) as Arc<dyn IdentityProvider>,
            api: connector,
            name,
        });
        self
    }

    /// Credential lifetime and login retry settings.
    ///
    /// Only the timing fields are read here; the account secret lives in the
    /// connector. Ignored when [`Self::credential_cache`] supplies a cache.
    #[must_use]
    pub fn credentials(mut self, cfg: CredentialConfig) -> Self {
        self.credentials = cfg;
        self
    }

    /// Share an existing credential cache instead of creating one.
    ///
    /// Behavior and trade-offs:
    /// - Lets several orchestrators (e.g. one per request) share a single
    ///   process-wide credential.
    /// - The cache must log in against the same upstream as the registered
    ///   connector.
    #[must_use]
    pub fn credential_cache(mut self, cache: Arc<CredentialCache>) -> Self {
        self.shared_cache = Some(cache);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: TallyConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Delay between status queries for one job.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.cfg.poll_interval = interval;
        self
    }

    /// Wall-clock ceiling for a job to become ready.
    ///
    /// Behavior and trade-offs:
    /// - Checked after every status query; the last query lands at the ceiling
    ///   so a job that turns ready just in time is still downloaded.
    #[must_use]
    pub const fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.poll_timeout = timeout;
        self
    }

    /// Upper bound for each single upstream call.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout = timeout;
        self
    }

    /// How the spreadsheet shape is produced.
    #[must_use]
    pub const fn spreadsheet_policy(mut self, policy: SpreadsheetPolicy) -> Self {
        self.cfg.spreadsheet = policy;
        self
    }

    /// What aggregation does when upstream rows already carry the provenance column.
    #[must_use]
    pub const fn provenance_policy(mut self, policy: ProvenancePolicy) -> Self {
        self.cfg.provenance = policy;
        self
    }

    /// Name of the provenance column written during aggregation.
    #[must_use]
    pub fn provenance_column(mut self, column: impl Into<String>) -> Self {
        self.cfg.provenance_column = column.into();
        self
    }

    /// Whether aggregated products run concurrently or in order.
    #[must_use]
    pub const fn aggregate_mode(mut self, mode: AggregateMode) -> Self {
        self.cfg.aggregate_mode = mode;
        self
    }

    /// Also strip numeric zero fields from JSON rows.
    #[must_use]
    pub const fn drop_zero_fields(mut self, yes: bool) -> Self {
        self.cfg.drop_zero_fields = yes;
        self
    }

    /// Build the `Tally` orchestrator.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no connector is registered, the poll interval is
    /// zero, or the provenance column name is blank.
    pub fn build(self) -> Result<Tally, TallyError> {
        let Some(upstream) = self.upstream else {
            return Err(TallyError::InvalidArg(
                "no connector registered; add one via with_connector(...)".to_string(),
            ));
        };
        if self.cfg.poll_interval.is_zero() {
            return Err(TallyError::InvalidArg(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.cfg.provenance_column.trim().is_empty() {
            return Err(TallyError::InvalidArg(
                "provenance column name must not be empty".to_string(),
            ));
        }

        let credentials = self.shared_cache.unwrap_or_else(|| {
            Arc::new(CredentialCache::new(upstream.identity, self.credentials))
        });
        let session = UpstreamSession::from_api(
            upstream.api,
            upstream.name,
            credentials,
            self.cfg.request_timeout,
        );
        Ok(Tally {
            session,
            cfg: self.cfg,
        })
    }
}

impl Tally {
    /// Start building a new `Tally` instance.
    ///
    /// Typical usage registers a connector and tunes the poll loop:
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// let gcore = Arc::new(tally_gcore::GcoreConnector::builder()
    ///     .credentials(&creds)
    ///     .build()?);
    ///
    /// let tally = tally::Tally::builder()
    ///     .with_connector(gcore)
    ///     .credentials(creds)
    ///     .poll_interval(Duration::from_secs(5))
    ///     .build()?;
    /// ```
    #[must_use]
    pub fn builder() -> TallyBuilder {
        TallyBuilder::new()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &TallyConfig {
        &self.cfg
    }

    /// Name of the registered connector.
    #[must_use]
    pub const fn connector_name(&self) -> &'static str {
        self.session.name()
    }

    /// The credential cache this orchestrator logs in through.
    #[must_use]
    pub const fn credentials(&self) -> &Arc<CredentialCache> {
        self.session.credentials()
    }

    pub(crate) fn transform_for(&self, client_id: &str) -> ReportTransform {
        ReportTransform::new(client_id, (&self.cfg).into())
    }
}
