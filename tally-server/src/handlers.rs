//! Request handlers. Each one negotiates the output format, runs the pipeline
//! and maps the result to a response body.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, header};

use tally::{JobId, JobState, ProductType};

use crate::error::ApiError;
use crate::models::{
    AggregateResponse, FormatBody, HealthResponse, ReportBody, ReportResponse, negotiate,
};
use crate::state::AppState;

fn accept(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::ACCEPT).and_then(|v| v.to_str().ok())
}

/// `GET /` and `GET /health`.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::now())
}

async fn product_report(
    product: ProductType,
    state: &AppState,
    headers: &HeaderMap,
    body: ReportBody,
) -> Result<Json<ReportResponse>, ApiError> {
    let request = body.into_request(accept(headers))?;
    tracing::info!(
        product = %product,
        client = %request.client_id,
        format = %request.format,
        "report requested"
    );
    let report = state.tally.generate(product, &request).await?;
    Ok(Json(ReportResponse::completed(
        report.job_id.to_string(),
        report.count,
        &report.data,
    )))
}

/// `POST /reports/cdn`.
pub async fn cdn_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ReportBody>,
) -> Result<Json<ReportResponse>, ApiError> {
    product_report(ProductType::Cdn, &state, &headers, body).await
}

/// `POST /reports/waap`.
pub async fn waap_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ReportBody>,
) -> Result<Json<ReportResponse>, ApiError> {
    product_report(ProductType::Waap, &state, &headers, body).await
}

/// `POST /reports/cloud`.
pub async fn cloud_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ReportBody>,
) -> Result<Json<ReportResponse>, ApiError> {
    product_report(ProductType::Cloud, &state, &headers, body).await
}

/// `POST /reports/all`: every product merged, tagged with its source.
pub async fn aggregate_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ReportBody>,
) -> Result<Json<AggregateResponse>, ApiError> {
    let request = body.into_request(accept(&headers))?;
    tracing::info!(client = %request.client_id, format = %request.format, "aggregated report requested");
    let report = state.tally.aggregate(request).run().await?;
    for failure in &report.failed {
        tracing::warn!(product = %failure.product, error = %failure.error, "product left out of aggregate");
    }
    Ok(Json(report.into()))
}

/// `GET /reports/gcore/{uuid}`: status of an existing job, with its raw rows
/// once it is ready.
pub async fn job_status(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    headers: HeaderMap,
    Query(query): Query<FormatBody>,
    body: Option<Json<FormatBody>>,
) -> Result<Json<ReportResponse>, ApiError> {
    let requested = body.and_then(|Json(b)| b.format).or(query.format);
    let format = negotiate(accept(&headers), requested.as_deref())?;
    let job_id = JobId::new(uuid);

    let status = state.tally.job_status(&job_id).await?;
    if status.state != JobState::Ready {
        return Ok(Json(ReportResponse::unfinished(
            job_id.to_string(),
            status.raw_state,
        )));
    }
    let raw = state.tally.fetch_raw(&job_id, format).await?;
    Ok(Json(ReportResponse::completed(
        raw.job_id.to_string(),
        raw.count,
        &raw.data,
    )))
}

/// `POST /reports/gcore/{uuid}/download`: raw rows of an existing job.
pub async fn job_download(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    headers: HeaderMap,
    body: Option<Json<FormatBody>>,
) -> Result<Json<ReportResponse>, ApiError> {
    let requested = body.and_then(|Json(b)| b.format);
    let format = negotiate(accept(&headers), requested.as_deref())?;
    let raw = state.tally.fetch_raw(&JobId::new(uuid), format).await?;
    Ok(Json(ReportResponse::completed(
        raw.job_id.to_string(),
        raw.count,
        &raw.data,
    )))
}
