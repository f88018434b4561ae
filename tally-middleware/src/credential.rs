//! Process-wide bearer credential cache.
//!
//! Behavior and trade-offs:
//! - A single entry keyed by `()`; the cache's coalescing `try_get_with` makes
//!   concurrent misses share one login.
//! - Entries expire `refresh_skew` before the credential's hard expiry, and
//!   every hit is re-checked against the wall clock before it is handed out.
//! - Only an unreachable identity endpoint is retried; a rejected secret fails
//!   immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use moka::Expiry;
use moka::future::Cache;
use tally_core::connector::IdentityProvider;
use tally_core::{Credential, CredentialConfig, TallyError};

struct SkewedExpiry {
    skew: Duration,
}

impl Expiry<(), Credential> for SkewedExpiry {
    fn expire_after_create(
        &self,
        _key: &(),
        value: &Credential,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.valid_for().saturating_sub(self.skew))
    }
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CredentialStats {
    /// Calls answered from the cache.
    pub hits: u64,
    /// Calls made to the identity endpoint, retries included.
    pub logins: u64,
}

/// Shared credential holder. Cheap to share behind an `Arc`.
pub struct CredentialCache {
    identity: Arc<dyn IdentityProvider>,
    config: CredentialConfig,
    cache: Cache<(), Credential>,
    hits: AtomicU64,
    logins: Arc<AtomicU64>,
}

impl CredentialCache {
    /// Create an empty cache that logs in through `identity`.
    pub fn new(identity: Arc<dyn IdentityProvider>, config: CredentialConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .expire_after(SkewedExpiry {
                skew: config.refresh_skew,
            })
            .build();
        Self {
            identity,
            config,
            cache,
            hits: AtomicU64::new(0),
            logins: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Settings this cache was built with.
    pub const fn config(&self) -> &CredentialConfig {
        &self.config
    }

    /// Return a usable credential, logging in if none is cached or it is stale.
    ///
    /// # Errors
    /// Returns `TallyError::Auth` when the identity endpoint rejects the secret
    /// or stays unreachable for `login_attempts` attempts.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "tally::credentials::get_valid_credential", skip(self))
    )]
    pub async fn get_valid_credential(&self) -> Result<Credential, TallyError> {
        if let Some(cred) = self.cache.get(&()).await {
            if cred.is_fresh_at(Utc::now(), self.config.refresh_skew) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(cred);
            }
            self.cache.invalidate(&()).await;
        }
        let login = login_with_retry(
            Arc::clone(&self.identity),
            Arc::clone(&self.logins),
            self.config.login_attempts.max(1),
            self.config.login_retry_delay,
        );
        self.cache
            .try_get_with((), login)
            .await
            .map_err(|e: Arc<TallyError>| (*e).clone())
    }

    /// Discard the cached credential, e.g. after upstream answered 401/403.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }

    /// Snapshot of hit and login counters.
    pub fn stats(&self) -> CredentialStats {
        CredentialStats {
            hits: self.hits.load(Ordering::Relaxed),
            logins: self.logins.load(Ordering::Relaxed),
        }
    }
}

async fn login_with_retry(
    identity: Arc<dyn IdentityProvider>,
    logins: Arc<AtomicU64>,
    attempts: u32,
    delay: Duration,
) -> Result<Credential, TallyError> {
    let mut attempt = 1;
    loop {
        logins.fetch_add(1, Ordering::Relaxed);
        match identity.login().await {
            Ok(cred) => return Ok(cred),
            Err(e) if e.is_auth() => return Err(e),
            Err(e) if e.is_transient() && attempt < attempts => {
                #[cfg(feature = "tracing")]
                tracing::warn!(attempt, error = %e, "identity endpoint unavailable; retrying login");
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(TallyError::auth(format!(
                    "login failed after {attempt} attempt(s): {e}"
                )));
            }
        }
    }
}
