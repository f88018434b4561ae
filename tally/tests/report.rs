mod helpers;

use std::io::Cursor;

use calamine::{Reader, Xlsx, open_workbook_from_rs};
use helpers::{request, scripted, scripted_builder};
use serde_json::json;
use tally::{JobPhase, OutputFormat, ProductType, RenderedReport, SpreadsheetPolicy, TallyError};
use tally_core::{RawPayload, XLSX_MEDIA_TYPE};
use tally_mock::MockBehavior;
use tally_mock::fixtures::{self, expected_rows};

#[tokio::test]
async fn cloud_csv_for_one_client_keeps_schema_and_nonzero_rows() {
    let (tally, _controller) = scripted("rp0");

    let report = tally
        .generate(ProductType::Cloud, &request(OutputFormat::Csv))
        .await
        .expect("report");

    assert_eq!(report.job_id, fixtures::job_id(ProductType::Cloud));
    assert_eq!(report.phase, JobPhase::Downloaded);
    assert_eq!(report.count, 2);
    let RenderedReport::Csv(text) = report.data else {
        panic!("expected csv");
    };
    let expected = "\
Client ID,Client name,Feature,Region,Metric name,Metric value,Unit,Date from,Date to
829449,Northwind Hosting,Instances: g1-standard-2-4,Luxembourg,Instance hours,\"1,104\",hours,2025-09-01,2025-09-24
829449,Northwind Hosting,Floating IP,Amsterdam,IP hours,552,hours,2025-09-01,2025-09-24
";
    assert_eq!(text, expected);
}

#[tokio::test]
async fn json_rows_are_pruned_of_empty_values() {
    let (tally, _controller) = scripted("rp1");

    let report = tally
        .generate(ProductType::Cdn, &request(OutputFormat::Json))
        .await
        .expect("report");

    assert_eq!(report.count, expected_rows(ProductType::Cdn));
    let RenderedReport::Json(rows) = report.data else {
        panic!("expected json");
    };
    assert_eq!(rows[0]["feature"], json!("Traffic"));
    assert!(!rows[0].contains_key("comment"));
    assert_eq!(rows[1]["feature"], json!("Shielding"));
    assert!(!rows[1].contains_key("tags"));
}

#[tokio::test]
async fn wrapped_json_payload_is_filtered_by_camel_case_fields() {
    let (tally, _controller) = scripted("rp2");

    let report = tally
        .generate(ProductType::Waap, &request(OutputFormat::Json))
        .await
        .expect("report");

    assert_eq!(report.count, 1);
    let RenderedReport::Json(rows) = report.data else {
        panic!("expected json");
    };
    assert_eq!(rows[0]["feature"], json!("WAAP Pro"));
    assert!(!rows[0].contains_key("meta"));
}

#[tokio::test]
async fn spreadsheet_is_an_xlsx_workbook_by_default() {
    let (tally, _controller) = scripted("rp3");

    let report = tally
        .generate(ProductType::Cloud, &request(OutputFormat::Spreadsheet))
        .await
        .expect("report");

    let RenderedReport::Spreadsheet { bytes, media_type } = report.data else {
        panic!("expected spreadsheet");
    };
    assert_eq!(media_type, XLSX_MEDIA_TYPE);
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).expect("workbook");
    let sheet = workbook.worksheet_range("Report").expect("report sheet");
    let cells: Vec<String> = sheet.cells().map(|(_, _, c)| c.to_string()).collect();
    assert!(cells.iter().any(|c| c == "Floating IP"));
    assert!(!cells.iter().any(|c| c == "Blue Finch Media"));
    assert_eq!(sheet.height(), 1 + expected_rows(ProductType::Cloud));
}

#[tokio::test]
async fn delimited_spreadsheet_policy_carries_csv_bytes() {
    let (builder, _controller) = scripted_builder("rp4");
    let tally = builder
        .spreadsheet_policy(SpreadsheetPolicy::DelimitedText)
        .build()
        .expect("builder");

    let report = tally
        .generate(ProductType::Cloud, &request(OutputFormat::Spreadsheet))
        .await
        .expect("report");

    let RenderedReport::Spreadsheet { bytes, media_type } = report.data else {
        panic!("expected spreadsheet");
    };
    assert_eq!(media_type, "text/csv");
    let text = String::from_utf8(bytes).expect("utf-8");
    assert!(text.starts_with("Client ID,Client name,"));
    assert_eq!(text.lines().count(), 3);
}

#[tokio::test]
async fn payload_without_client_field_is_a_configuration_error() {
    let (tally, controller) = scripted("rp5");
    controller
        .set_download(
            &fixtures::job_id(ProductType::Cdn),
            MockBehavior::Return(RawPayload::new(
                r#"[{"account": "829449", "metric_value": 3}]"#,
                "application/json",
            )),
        )
        .await;

    let err = tally
        .generate(ProductType::Cdn, &request(OutputFormat::Json))
        .await
        .expect_err("must fail");

    assert!(matches!(err, TallyError::Configuration(_)));
}

#[tokio::test]
async fn raw_fetch_keeps_every_row_and_empty_value() {
    let (tally, controller) = scripted("rp6");
    let job = fixtures::job_id(ProductType::Cdn);

    let raw = tally
        .fetch_raw(&job, OutputFormat::Json)
        .await
        .expect("raw report");

    assert_eq!(raw.job_id, job);
    assert_eq!(raw.count, 4);
    let RenderedReport::Json(rows) = raw.data else {
        panic!("expected json");
    };
    assert_eq!(rows[0]["comment"], json!(null));
    assert_eq!(rows[3]["client_id"], json!(771203));
    assert_eq!(controller.status_calls(&job).await, 0);
}

#[tokio::test]
async fn raw_fetch_of_unknown_job_surfaces_upstream_rejection() {
    let (tally, _controller) = scripted("rp7");

    let err = tally
        .fetch_raw(&tally::JobId::new("does-not-exist"), OutputFormat::Csv)
        .await
        .expect_err("must fail");

    assert!(matches!(
        err,
        TallyError::UpstreamRejected { status: 404, .. }
    ));
}
