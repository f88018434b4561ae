// Shared builders so tests can `use helpers::*;`
#![allow(dead_code)]

use std::time::Duration;

use tally::{OutputFormat, ReportRequest, Tally, TallyBuilder};
use tally_mock::fixtures::{SCENARIO_CLIENT, scenario_range};
use tally_mock::{ScriptedConnector, ScriptedController};

pub const POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// Builder over a fresh scripted upstream with test-friendly poll settings.
pub fn scripted_builder(name: &'static str) -> (TallyBuilder, ScriptedController) {
    let (mock, controller) = ScriptedConnector::new_with_controller(name);
    let builder = Tally::builder()
        .with_connector(mock)
        .poll_interval(POLL_INTERVAL)
        .poll_timeout(POLL_TIMEOUT);
    (builder, controller)
}

pub fn scripted(name: &'static str) -> (Tally, ScriptedController) {
    let (builder, controller) = scripted_builder(name);
    (builder.build().expect("valid builder"), controller)
}

pub fn request(format: OutputFormat) -> ReportRequest {
    ReportRequest::new(SCENARIO_CLIENT, scenario_range(), format).expect("valid request")
}
