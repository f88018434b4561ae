use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use tally::{JobId, ProductType, Tally, TallyError};
use tally_core::XLSX_MEDIA_TYPE;
use tally_mock::fixtures::{SCENARIO_CLIENT, expected_rows, job_id};
use tally_mock::{MockBehavior, MockConnector, ScriptedConnector, ScriptedController, status};
use tally_server::{AppState, create_router};

fn app() -> Router {
    let tally = Tally::builder()
        .with_connector(Arc::new(MockConnector::new()))
        .build()
        .unwrap();
    create_router(AppState::new(tally), &["*".to_string()])
}

fn scripted_app() -> (Router, ScriptedController) {
    let (mock, controller) = ScriptedConnector::new_with_controller("scripted-server");
    let tally = Tally::builder().with_connector(mock).build().unwrap();
    (create_router(AppState::new(tally), &[]), controller)
}

fn report_body(format: &str) -> Value {
    json!({
        "gcore_user_id": SCENARIO_CLIENT.parse::<u64>().unwrap(),
        "start_date": "2025-09-01",
        "end_date": "2025-09-24",
        "format": format,
    })
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_service_and_version() {
    for uri in ["/", "/health"] {
        let (code, body) = send(app(), Request::get(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "tally-server");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn product_report_returns_client_rows() {
    let (code, body) = send(app(), post_json("/reports/cloud", &report_body("json"))).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["uuid"], job_id(ProductType::Cloud).as_str());
    assert_eq!(body["status"], "completed");
    assert_eq!(body["count"], expected_rows(ProductType::Cloud));
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), expected_rows(ProductType::Cloud));
    for row in rows {
        assert_eq!(row["Client ID"], SCENARIO_CLIENT);
    }
}

#[tokio::test]
async fn csv_accept_header_overrides_json_body() {
    let req = Request::post("/reports/cloud")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "text/csv")
        .body(Body::from(report_body("json").to_string()))
        .unwrap();
    let (code, body) = send(app(), req).await;
    assert_eq!(code, StatusCode::OK);
    let text = body["data"].as_str().unwrap();
    assert!(text.starts_with("Client ID,Client name,Feature,Region,Metric name,Metric value"));
    assert_eq!(text.lines().count(), 1 + expected_rows(ProductType::Cloud));
}

#[tokio::test]
async fn excel_format_returns_base64_envelope() {
    let (code, body) = send(app(), post_json("/reports/waap", &report_body("excel"))).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["count"], expected_rows(ProductType::Waap));
    let data = &body["data"];
    assert_eq!(data["content_type"], XLSX_MEDIA_TYPE);
    assert_eq!(data["format"], "excel");
    assert!(data["size_bytes"].as_u64().unwrap() > 0);
    // zip local file header, base64 encoded
    assert!(data["data"].as_str().unwrap().starts_with("UEsDB"));
}

#[tokio::test]
async fn aggregate_tags_every_row_with_its_product() {
    let (code, body) = send(app(), post_json("/reports/all", &report_body("json"))).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["uuid"], "aggregated");
    assert_eq!(body["status"], "completed");
    let total: usize = ProductType::ALL.into_iter().map(expected_rows).sum();
    assert_eq!(body["count"], total);
    assert_eq!(body["succeeded"], json!(["CDN", "WAAP", "CLOUD"]));
    assert_eq!(body["failed"], json!([]));
    let labels: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Product"].as_str().unwrap())
        .collect();
    assert_eq!(labels, ["CDN", "CDN", "WAAP", "CLOUD", "CLOUD"]);
}

#[tokio::test]
async fn aggregate_lists_failed_products() {
    let (app, controller) = scripted_app();
    controller
        .set_features(
            ProductType::Cloud,
            MockBehavior::Fail(TallyError::unavailable("features", "connection reset")),
        )
        .await;
    let (code, body) = send(app, post_json("/reports/all", &report_body("json"))).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(
        body["count"],
        expected_rows(ProductType::Cdn) + expected_rows(ProductType::Waap)
    );
    assert_eq!(body["failed"][0]["product"], "CLOUD");
    assert_eq!(body["failed"][0]["kind"], "upstream_unavailable");
}

#[tokio::test]
async fn rejected_login_is_unauthorized() {
    let (app, controller) = scripted_app();
    controller
        .set_login(MockBehavior::Fail(TallyError::auth("invalid credentials")))
        .await;
    let (code, body) = send(app, post_json("/reports/cdn", &report_body("json"))).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "auth_error");
}

#[tokio::test]
async fn invalid_input_is_a_bad_request() {
    let mut inverted = report_body("json");
    inverted["start_date"] = json!("2025-09-30");
    let (code, body) = send(app(), post_json("/reports/cdn", &inverted)).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_argument");

    let (code, body) = send(app(), post_json("/reports/cdn", &report_body("pdf"))).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("pdf"));
}

#[tokio::test]
async fn ready_job_status_includes_raw_rows() {
    let uri = format!("/reports/gcore/{}", job_id(ProductType::Cdn));
    let (code, body) = send(app(), Request::get(&uri).body(Body::empty()).unwrap()).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    // unfiltered: rows of every client are kept
    assert_eq!(body["count"], 4);
    assert!(body["data"].as_array().unwrap()[0]["comment"].is_null());
}

#[tokio::test]
async fn unfinished_job_reports_its_state_without_data() {
    let (app, controller) = scripted_app();
    let id = job_id(ProductType::Cdn);
    controller
        .set_status(&id, MockBehavior::Return(status("processing")))
        .await;
    let uri = format!("/reports/gcore/{id}");
    let (code, body) = send(app, Request::get(&uri).body(Body::empty()).unwrap()).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(
        body,
        json!({"uuid": id.as_str(), "status": "processing", "count": 0, "data": []})
    );
    assert_eq!(controller.downloads(&id).await, 0);
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let req = Request::get("/reports/gcore/no-such-job").body(Body::empty()).unwrap();
    let (code, body) = send(app(), req).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "upstream_rejected");
}

#[tokio::test]
async fn download_returns_raw_rows_in_requested_format() {
    let id: JobId = job_id(ProductType::Waap);
    let uri = format!("/reports/gcore/{id}/download");
    let (code, body) = send(app(), post_json(&uri, &json!({"format": "csv"}))).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["uuid"], id.as_str());
    assert_eq!(body["status"], "completed");
    assert_eq!(body["count"], 3);
    assert!(body["data"].is_string());

    let req = Request::post(&uri).body(Body::empty()).unwrap();
    let (code, body) = send(app(), req).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}
