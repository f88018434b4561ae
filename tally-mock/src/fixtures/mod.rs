//! Deterministic report payloads and feature catalogs.
//!
//! The three products use three different payload shapes so every
//! normalization path is exercised: CDN is a JSON array, WAAP is a JSON
//! `data` wrapper and CLOUD is delimited text.

use tally_core::{DateRange, JobId, ProductType, RawPayload};

mod payloads;

/// Client whose rows the fixtures are built around.
pub const SCENARIO_CLIENT: &str = "829449";

/// Rows of [`SCENARIO_CLIENT`] that survive filtering, per product.
#[must_use]
pub const fn expected_rows(product: ProductType) -> usize {
    match product {
        ProductType::Cdn => 2,
        ProductType::Waap => 1,
        ProductType::Cloud => 2,
    }
}

/// Reporting period the fixtures cover: 2025-09-01 to 2025-09-24.
#[must_use]
pub fn scenario_range() -> DateRange {
    DateRange::parse("2025-09-01", "2025-09-24").expect("fixture range is valid")
}

/// Feature identifiers the mock catalog assigns to `product`.
#[must_use]
pub fn feature_ids(product: ProductType) -> Vec<u64> {
    match product {
        ProductType::Cdn => vec![101, 102],
        ProductType::Waap => vec![201],
        ProductType::Cloud => vec![301, 302],
    }
}

/// Product owning a feature identifier, if any.
#[must_use]
pub fn product_for_feature(id: u64) -> Option<ProductType> {
    ProductType::ALL
        .into_iter()
        .find(|p| feature_ids(*p).contains(&id))
}

/// Job identifier the mock hands out for `product`.
#[must_use]
pub fn job_id(product: ProductType) -> JobId {
    JobId::new(format!("mock-{}-job", product.as_str().to_ascii_lowercase()))
}

/// Product a mock job identifier belongs to.
#[must_use]
pub fn product_for_job(id: &JobId) -> Option<ProductType> {
    ProductType::ALL.into_iter().find(|p| job_id(*p) == *id)
}

/// Downloaded payload for `product`.
#[must_use]
pub fn payload(product: ProductType) -> RawPayload {
    match product {
        ProductType::Cdn => RawPayload::new(payloads::CDN_JSON, "application/json"),
        ProductType::Waap => RawPayload::new(payloads::WAAP_JSON, "application/json"),
        ProductType::Cloud => RawPayload::new(payloads::CLOUD_CSV, "text/csv; charset=utf-8"),
    }
}

/// Raw CLOUD delimited text, as upstream sends it.
#[must_use]
pub const fn cloud_csv() -> &'static str {
    payloads::CLOUD_CSV
}
