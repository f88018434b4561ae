//! tally-server
//!
//! HTTP surface over the tally orchestrator: per-product and aggregated usage
//! reports for one client, plus status and download of existing upstream jobs.
//!
//! Routes:
//! - `GET /`, `GET /health`: liveness.
//! - `POST /reports/cdn`, `/reports/waap`, `/reports/cloud`: one product.
//! - `POST /reports/all`: every product, tagged with its source.
//! - `GET /reports/gcore/{uuid}`: job status; raw rows once ready.
//! - `POST /reports/gcore/{uuid}/download`: raw rows of a job.
//!
//! Settings come from the environment, see [`config::ServiceConfig`].
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
