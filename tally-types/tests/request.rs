use chrono::NaiveDate;
use tally_types::{DateRange, OutputFormat, ProductType, ReportRequest, TallyError, XLSX_MEDIA_TYPE};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn date_range_rejects_inverted_bounds() {
    let err = DateRange::try_new(day(2025, 9, 24), day(2025, 9, 1)).unwrap_err();
    assert!(matches!(err, TallyError::InvalidArg(_)));

    let single = DateRange::try_new(day(2025, 9, 1), day(2025, 9, 1)).expect("same day is fine");
    assert_eq!(single.start(), single.end());
}

#[test]
fn date_range_parse_validates_format() {
    let r = DateRange::parse("2025-09-01", " 2025-09-24 ").expect("parse");
    assert_eq!(r.end(), day(2025, 9, 24));
    assert!(DateRange::parse("01/09/2025", "2025-09-24").is_err());
}

#[test]
fn date_range_deserialize_enforces_order() {
    let ok: DateRange =
        serde_json::from_str(r#"{"start":"2025-09-01","end":"2025-09-24"}"#).expect("ok");
    assert_eq!(ok.start(), day(2025, 9, 1));
    let bad = serde_json::from_str::<DateRange>(r#"{"start":"2025-10-01","end":"2025-09-24"}"#);
    assert!(bad.is_err());
}

#[test]
fn format_aliases_parse() {
    assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
    assert_eq!("excel".parse::<OutputFormat>().unwrap(), OutputFormat::Spreadsheet);
    assert_eq!("xlsx".parse::<OutputFormat>().unwrap(), OutputFormat::Spreadsheet);
    assert!("pdf".parse::<OutputFormat>().is_err());
}

#[test]
fn accept_header_wins_unless_json() {
    assert_eq!(
        OutputFormat::negotiate(Some("text/csv"), Some(OutputFormat::Json)),
        OutputFormat::Csv
    );
    assert_eq!(
        OutputFormat::negotiate(Some(XLSX_MEDIA_TYPE), None),
        OutputFormat::Spreadsheet
    );
    assert_eq!(
        OutputFormat::negotiate(Some("application/json"), Some(OutputFormat::Csv)),
        OutputFormat::Csv
    );
    assert_eq!(OutputFormat::negotiate(Some("*/*"), None), OutputFormat::Json);
    assert_eq!(OutputFormat::negotiate(None, None), OutputFormat::Json);
}

#[test]
fn report_request_trims_and_rejects_blank_client() {
    let range = DateRange::try_new(day(2025, 9, 1), day(2025, 9, 24)).unwrap();
    let req = ReportRequest::new(" 829449 ", range, OutputFormat::Json).expect("valid");
    assert_eq!(req.client_id, "829449");
    assert!(ReportRequest::new("   ", range, OutputFormat::Json).is_err());
}

#[test]
fn product_type_parses_case_insensitively() {
    assert_eq!("cloud".parse::<ProductType>().unwrap(), ProductType::Cloud);
    assert_eq!(" Waap".parse::<ProductType>().unwrap(), ProductType::Waap);
    assert!("dns".parse::<ProductType>().is_err());
    assert_eq!(ProductType::Cdn.to_string(), "CDN");
}
