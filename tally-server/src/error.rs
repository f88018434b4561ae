use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use tally::TallyError;

/// A pipeline error on its way to the caller.
#[derive(Debug)]
pub struct ApiError(pub TallyError);

impl From<TallyError> for ApiError {
    fn from(e: TallyError) -> Self {
        Self(e)
    }
}

impl ApiError {
    /// HTTP status reported for the wrapped error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match &self.0 {
            TallyError::Auth { .. } => StatusCode::UNAUTHORIZED,
            TallyError::InvalidArg(_) | TallyError::NoFeaturesConfigured { .. } => {
                StatusCode::BAD_REQUEST
            }
            TallyError::UpstreamRejected { status: 404, .. } => StatusCode::NOT_FOUND,
            TallyError::ReportTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            TallyError::UpstreamUnavailable { .. }
            | TallyError::UpstreamRejected { .. }
            | TallyError::Protocol { .. }
            | TallyError::ReportGenerationFailed { .. }
            | TallyError::Transform(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = %self.0, "request failed");
        } else {
            tracing::warn!(kind = self.0.kind(), error = %self.0, "request rejected");
        }
        let body = Json(json!({
            "detail": self.0.to_string(),
            "kind": self.0.kind(),
        }));
        (status, body).into_response()
    }
}
