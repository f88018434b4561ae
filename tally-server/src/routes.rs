//! Router assembly.

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the service router.
///
/// `origins` lists the allowed CORS origins; an empty list or `*` allows any.
/// Origins that are not valid header values are skipped.
pub fn create_router(state: AppState, origins: &[String]) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/health", get(handlers::health))
        .route("/reports/cdn", post(handlers::cdn_report))
        .route("/reports/waap", post(handlers::waap_report))
        .route("/reports/cloud", post(handlers::cloud_report))
        .route("/reports/all", post(handlers::aggregate_report))
        .route("/reports/gcore/:uuid", get(handlers::job_status))
        .route("/reports/gcore/:uuid/download", post(handlers::job_download))
        .layer(cors_layer(origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
