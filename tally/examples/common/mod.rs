use std::sync::Arc;

use tally::{CredentialConfig, Tally, TallyBuilder};

/// Builder over the mock upstream when `TALLY_EXAMPLES_USE_MOCK` is set,
/// otherwise over the live Gcore API using `GCORE_USERNAME`/`GCORE_PASSWORD`.
pub fn builder() -> Result<TallyBuilder, Box<dyn std::error::Error>> {
    if std::env::var("TALLY_EXAMPLES_USE_MOCK").is_ok() {
        println!("--- (Using Mock Connector for CI) ---");
        return Ok(Tally::builder().with_connector(Arc::new(tally_mock::MockConnector::new())));
    }
    let creds = CredentialConfig::new(
        std::env::var("GCORE_USERNAME")?,
        std::env::var("GCORE_PASSWORD")?,
    );
    let gcore = tally_gcore::GcoreConnector::builder()
        .credentials(&creds)
        .build()?;
    Ok(Tally::builder()
        .with_connector(Arc::new(gcore))
        .credentials(creds))
}
