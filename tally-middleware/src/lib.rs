//! tally-middleware
//!
//! Wrappers that sit between the orchestrator and a raw connector:
//!
//! - [`CredentialCache`]: lazily obtains, reuses and invalidates the bearer
//!   credential, converging concurrent refreshes on one login.
//! - [`UpstreamSession`]: runs each reporting call with a valid credential under
//!   a per-call timeout, and retries once with a fresh credential when upstream
//!   answers with an authentication failure.
#![warn(missing_docs)]

mod credential;
mod session;

pub use crate::credential::{CredentialCache, CredentialStats};
pub use crate::session::UpstreamSession;
