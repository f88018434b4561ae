use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Bearer token issued by the identity endpoint.
///
/// Usable only while `now < issued_at + valid_for`. The token never appears in
/// `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    issued_at: DateTime<Utc>,
    valid_for: Duration,
}

impl Credential {
    /// Wrap a token issued at `issued_at`.
    pub fn new(token: impl Into<String>, issued_at: DateTime<Utc>, valid_for: Duration) -> Self {
        Self {
            token: token.into(),
            issued_at,
            valid_for,
        }
    }

    /// Wrap a token issued now.
    pub fn issued_now(token: impl Into<String>, valid_for: Duration) -> Self {
        Self::new(token, Utc::now(), valid_for)
    }

    /// The raw token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// `Authorization` header value.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// When the token was issued.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Declared validity window.
    #[must_use]
    pub const fn valid_for(&self) -> Duration {
        self.valid_for
    }

    /// Hard expiry instant.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.valid_for)
            .ok()
            .and_then(|d| self.issued_at.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// True while `now` is before the hard expiry.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }

    /// True while `now + skew` is before the hard expiry.
    ///
    /// Used to refresh slightly early so a token never expires mid-request.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        match TimeDelta::from_std(skew)
            .ok()
            .and_then(|s| now.checked_add_signed(s))
        {
            Some(shifted) => shifted < self.expires_at(),
            None => false,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("valid_for", &self.valid_for)
            .finish()
    }
}
