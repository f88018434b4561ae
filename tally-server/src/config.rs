//! Environment-driven settings for the HTTP service.
//!
//! Every value has a default except the upstream account. Durations are whole
//! seconds. Blank variables count as unset.

use std::sync::Arc;
use std::time::Duration;

use tally::{
    AggregateMode, CredentialConfig, ProvenancePolicy, SpreadsheetPolicy, Tally, TallyConfig,
    TallyError,
};
use tally_core::GcoreEndpoints;
use tally_gcore::GcoreConnector;

/// Settings for one service process.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upstream base URL and path templates.
    pub endpoints: GcoreEndpoints,
    /// Upstream account and credential lifetime.
    pub credentials: CredentialConfig,
    /// Orchestrator settings.
    pub tally: TallyConfig,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Allowed CORS origins; `*` allows any.
    pub cors_origins: Vec<String>,
}

impl ServiceConfig {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `Configuration` for a missing account or an unparseable value.
    pub fn from_env() -> Result<Self, TallyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    /// Returns `Configuration` for a missing account or an unparseable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TallyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| TallyError::Configuration(format!("{key} must be set")))
        };

        let defaults = GcoreEndpoints::default();
        let base = get("GCORE_API_BASE").unwrap_or(defaults.base_url);
        let endpoints = GcoreEndpoints {
            base_url: base.trim_end_matches('/').to_string(),
            auth_path: get("GCORE_AUTH_PATH").unwrap_or(defaults.auth_path),
            features_path: get("GCORE_FEATURES_PATH").unwrap_or(defaults.features_path),
            generate_path: get("GCORE_GENERATE_PATH").unwrap_or(defaults.generate_path),
            status_path: get("GCORE_STATUS_PATH").unwrap_or(defaults.status_path),
            download_path: get("GCORE_DOWNLOAD_PATH").unwrap_or(defaults.download_path),
        };

        let mut credentials =
            CredentialConfig::new(required("GCORE_USERNAME")?, required("GCORE_PASSWORD")?);
        credentials.valid_for = seconds(get("TOKEN_CACHE_DURATION"), "TOKEN_CACHE_DURATION", 1800)?;

        let tally = TallyConfig {
            poll_interval: seconds(get("REPORT_POLL_INTERVAL"), "REPORT_POLL_INTERVAL", 10)?,
            poll_timeout: seconds(get("REPORT_POLL_TIMEOUT"), "REPORT_POLL_TIMEOUT", 600)?,
            request_timeout: seconds(get("REQUEST_TIMEOUT"), "REQUEST_TIMEOUT", 30)?,
            spreadsheet: spreadsheet_policy(get("SPREADSHEET_POLICY"))?,
            provenance: provenance_policy(get("PROVENANCE_POLICY"))?,
            provenance_column: get("PROVENANCE_COLUMN").unwrap_or_else(|| "Product".to_string()),
            aggregate_mode: aggregate_mode(get("AGGREGATE_MODE"))?,
            drop_zero_fields: flag(get("DROP_ZERO_FIELDS"), "DROP_ZERO_FIELDS")?,
        };

        let port = match get("APP_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| {
                TallyError::Configuration(format!("APP_PORT '{raw}' is not a port: {e}"))
            })?,
            None => 8080,
        };
        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(ToString::to_string)
            .collect();

        Ok(Self {
            endpoints,
            credentials,
            tally,
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level: get("LOG_LEVEL")
                .unwrap_or_else(|| "info".to_string())
                .to_ascii_lowercase(),
            cors_origins,
        })
    }

    /// `host:port` to bind the listener to.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True when every origin is allowed.
    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }

    /// Build the orchestrator over the live upstream connector.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the connector or orchestrator rejects the settings.
    pub fn build_tally(&self) -> Result<Tally, TallyError> {
        let gcore = GcoreConnector::builder()
            .endpoints(self.endpoints.clone())
            .credentials(&self.credentials)
            .request_timeout(self.tally.request_timeout)
            .build()?;
        Tally::builder()
            .with_connector(Arc::new(gcore))
            .credentials(self.credentials.clone())
            .config(self.tally.clone())
            .build()
    }
}

fn seconds(raw: Option<String>, key: &str, default: u64) -> Result<Duration, TallyError> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(default));
    };
    raw.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| TallyError::Configuration(format!("{key} '{raw}' is not a number of seconds: {e}")))
}

fn flag(raw: Option<String>, key: &str) -> Result<bool, TallyError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("0" | "false" | "no" | "off") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some(other) => Err(TallyError::Configuration(format!(
            "{key} '{other}' is not a boolean"
        ))),
    }
}

fn spreadsheet_policy(raw: Option<String>) -> Result<SpreadsheetPolicy, TallyError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("xlsx") => Ok(SpreadsheetPolicy::Xlsx),
        Some("csv" | "delimited") => Ok(SpreadsheetPolicy::DelimitedText),
        Some(other) => Err(TallyError::Configuration(format!(
            "SPREADSHEET_POLICY must be xlsx or csv (got '{other}')"
        ))),
    }
}

fn provenance_policy(raw: Option<String>) -> Result<ProvenancePolicy, TallyError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("preserve") => Ok(ProvenancePolicy::PreserveUpstream),
        Some("overwrite") => Ok(ProvenancePolicy::Overwrite),
        Some(other) => Err(TallyError::Configuration(format!(
            "PROVENANCE_POLICY must be preserve or overwrite (got '{other}')"
        ))),
    }
}

fn aggregate_mode(raw: Option<String>) -> Result<AggregateMode, TallyError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("concurrent") => Ok(AggregateMode::Concurrent),
        Some("sequential") => Ok(AggregateMode::Sequential),
        Some(other) => Err(TallyError::Configuration(format!(
            "AGGREGATE_MODE must be concurrent or sequential (got '{other}')"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const ACCOUNT: [(&str, &str); 2] = [("GCORE_USERNAME", "ops"), ("GCORE_PASSWORD", "secret")];

    #[test]
    fn defaults_apply_when_only_the_account_is_set() {
        let cfg = ServiceConfig::from_lookup(lookup(&ACCOUNT)).unwrap();
        assert_eq!(cfg.endpoints, GcoreEndpoints::default());
        assert_eq!(cfg.credentials.valid_for, Duration::from_secs(1800));
        assert_eq!(cfg.tally.poll_interval, Duration::from_secs(10));
        assert_eq!(cfg.tally.poll_timeout, Duration::from_secs(600));
        assert_eq!(cfg.tally.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.tally.spreadsheet, SpreadsheetPolicy::Xlsx);
        assert_eq!(cfg.tally.aggregate_mode, AggregateMode::Concurrent);
        assert!(!cfg.tally.drop_zero_fields);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.allows_any_origin());
    }

    #[test]
    fn missing_account_is_a_configuration_error() {
        let err = ServiceConfig::from_lookup(lookup(&[("GCORE_USERNAME", "ops")])).unwrap_err();
        assert_eq!(err, TallyError::Configuration("GCORE_PASSWORD must be set".into()));

        let err = ServiceConfig::from_lookup(lookup(&[
            ("GCORE_USERNAME", "  "),
            ("GCORE_PASSWORD", "secret"),
        ]))
        .unwrap_err();
        assert_eq!(err.kind(), "configuration_error");
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = ACCOUNT.to_vec();
        pairs.extend([
            ("GCORE_API_BASE", "http://localhost:9000/"),
            ("GCORE_STATUS_PATH", "/files/{uuid}/state"),
            ("TOKEN_CACHE_DURATION", "900"),
            ("REPORT_POLL_INTERVAL", "2"),
            ("REPORT_POLL_TIMEOUT", "120"),
            ("SPREADSHEET_POLICY", "CSV"),
            ("PROVENANCE_POLICY", "overwrite"),
            ("AGGREGATE_MODE", "sequential"),
            ("DROP_ZERO_FIELDS", "yes"),
            ("APP_HOST", "127.0.0.1"),
            ("APP_PORT", "9090"),
            ("LOG_LEVEL", "DEBUG"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
        ]);
        let cfg = ServiceConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(cfg.endpoints.base_url, "http://localhost:9000");
        assert_eq!(cfg.endpoints.status_path, "/files/{uuid}/state");
        assert_eq!(cfg.endpoints.auth_path, "/iam/auth/jwt/login");
        assert_eq!(cfg.credentials.valid_for, Duration::from_secs(900));
        assert_eq!(cfg.tally.poll_interval, Duration::from_secs(2));
        assert_eq!(cfg.tally.poll_timeout, Duration::from_secs(120));
        assert_eq!(cfg.tally.spreadsheet, SpreadsheetPolicy::DelimitedText);
        assert_eq!(cfg.tally.provenance, ProvenancePolicy::Overwrite);
        assert_eq!(cfg.tally.aggregate_mode, AggregateMode::Sequential);
        assert!(cfg.tally.drop_zero_fields);
        assert_eq!(cfg.bind_addr(), "127.0.0.1:9090");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert!(!cfg.allows_any_origin());
    }

    #[test]
    fn unparseable_values_are_rejected() {
        for (key, value) in [
            ("REPORT_POLL_INTERVAL", "ten"),
            ("APP_PORT", "70000"),
            ("DROP_ZERO_FIELDS", "maybe"),
            ("SPREADSHEET_POLICY", "ods"),
        ] {
            let mut pairs = ACCOUNT.to_vec();
            pairs.push((key, value));
            let err = ServiceConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert_eq!(err.kind(), "configuration_error", "{key}={value}");
        }
    }

    #[test]
    fn live_orchestrator_builds_from_settings() {
        let cfg = ServiceConfig::from_lookup(lookup(&ACCOUNT)).unwrap();
        let tally = cfg.build_tally().unwrap();
        assert_eq!(tally.config().poll_interval, Duration::from_secs(10));
    }
}
