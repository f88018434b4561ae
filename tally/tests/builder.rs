mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{request, scripted_builder};
use tally::{CredentialCache, CredentialConfig, OutputFormat, ProductType, Tally, TallyError};
use tally_mock::{MockConnector, ScriptedConnector};

#[test]
fn build_requires_a_connector() {
    let err = Tally::builder().build().err().expect("must fail");
    assert!(matches!(err, TallyError::InvalidArg(_)));
}

#[test]
fn build_rejects_zero_poll_interval_and_blank_provenance_column() {
    let (builder, _c) = scripted_builder("bd0");
    let err = builder
        .poll_interval(Duration::ZERO)
        .build()
        .err()
        .expect("must fail");
    assert!(matches!(err, TallyError::InvalidArg(_)));

    let (builder, _c) = scripted_builder("bd1");
    let err = builder
        .provenance_column("  ")
        .build()
        .err()
        .expect("must fail");
    assert!(matches!(err, TallyError::InvalidArg(_)));
}

#[test]
fn builder_settings_reach_the_config() {
    let tally = Tally::builder()
        .with_connector(Arc::new(MockConnector::new()))
        .poll_interval(Duration::from_secs(2))
        .poll_timeout(Duration::from_secs(20))
        .request_timeout(Duration::from_secs(3))
        .drop_zero_fields(true)
        .build()
        .expect("builder");

    let cfg = tally.config();
    assert_eq!(cfg.poll_interval, Duration::from_secs(2));
    assert_eq!(cfg.poll_timeout, Duration::from_secs(20));
    assert_eq!(cfg.request_timeout, Duration::from_secs(3));
    assert!(cfg.drop_zero_fields);
    assert_eq!(cfg.provenance_column, "Product");
    assert_eq!(tally.connector_name(), "tally-mock");
}

#[tokio::test]
async fn orchestrators_can_share_one_credential_cache() {
    let (mock, controller) = ScriptedConnector::new_with_controller("bd2");
    let cache = Arc::new(CredentialCache::new(
        mock.clone(),
        CredentialConfig::new("reseller", "secret"),
    ));
    let build = || {
        Tally::builder()
            .with_connector(mock.clone())
            .credential_cache(Arc::clone(&cache))
            .build()
            .expect("builder")
    };
    let first = build();
    let second = build();

    first
        .generate(ProductType::Cdn, &request(OutputFormat::Json))
        .await
        .expect("first report");
    second
        .generate(ProductType::Waap, &request(OutputFormat::Json))
        .await
        .expect("second report");

    assert_eq!(controller.logins().await, 1);
    assert!(second.credentials().stats().hits > 0);
}

#[tokio::test]
async fn static_mock_serves_end_to_end_reports() {
    let tally = Tally::builder()
        .with_connector(Arc::new(MockConnector::new()))
        .build()
        .expect("builder");

    let all = tally
        .aggregate(request(OutputFormat::Csv))
        .run()
        .await
        .expect("aggregate");

    assert_eq!(all.count, 5);
    assert!(all.failed.is_empty());
}
