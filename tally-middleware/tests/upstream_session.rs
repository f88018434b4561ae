use std::sync::Arc;
use std::time::Duration;

use tally_core::{CredentialConfig, JobState, ProductType, TallyError};
use tally_middleware::{CredentialCache, UpstreamSession};
use tally_mock::fixtures;
use tally_mock::{MockBehavior, ScriptedConnector, ScriptedController, status};

fn session(name: &'static str, timeout: Duration) -> (UpstreamSession, ScriptedController) {
    let (mock, controller) = ScriptedConnector::new_with_controller(name);
    let cache = Arc::new(CredentialCache::new(
        mock.clone(),
        CredentialConfig::new("reseller", "secret"),
    ));
    (UpstreamSession::new(mock, cache, timeout), controller)
}

#[tokio::test]
async fn rejected_credential_is_refreshed_and_call_retried_once() {
    let (session, controller) = session("us0", Duration::from_secs(5));
    let job = fixtures::job_id(ProductType::Cdn);
    controller
        .push_statuses(
            &job,
            [
                MockBehavior::Fail(TallyError::auth("token expired")),
                MockBehavior::Return(status("processing")),
            ],
        )
        .await;

    let st = session.get_status(&job).await.expect("retried call succeeds");

    assert_eq!(st.state, JobState::Running);
    assert_eq!(controller.logins().await, 2);
    let tokens = controller.tokens_seen().await;
    assert_eq!(tokens.len(), 2);
    assert_ne!(tokens[0], tokens[1]);
}

#[tokio::test]
async fn second_rejection_is_returned() {
    let (session, controller) = session("us1", Duration::from_secs(5));
    controller
        .set_features(
            ProductType::Waap,
            MockBehavior::Fail(TallyError::auth("forbidden")),
        )
        .await;

    let err = session
        .list_feature_ids(ProductType::Waap)
        .await
        .expect_err("must fail");

    assert!(err.is_auth());
    assert_eq!(controller.feature_calls().await.len(), 2);
    assert_eq!(controller.logins().await, 2);
}

#[tokio::test]
async fn non_auth_failures_are_not_retried() {
    let (session, controller) = session("us2", Duration::from_secs(5));
    let job = fixtures::job_id(ProductType::Cloud);
    controller
        .set_status(
            &job,
            MockBehavior::Fail(TallyError::unavailable("status", "502 bad gateway")),
        )
        .await;

    let err = session.get_status(&job).await.expect_err("must fail");

    assert!(err.is_transient());
    assert_eq!(controller.status_calls(&job).await, 1);
    assert_eq!(controller.logins().await, 1);
}

#[tokio::test(start_paused = true)]
async fn hanging_call_times_out_as_unavailable() {
    let (session, controller) = session("us3", Duration::from_secs(5));
    let job = fixtures::job_id(ProductType::Cloud);
    controller.set_download(&job, MockBehavior::Hang).await;

    let err = session.download(&job).await.expect_err("must time out");

    match err {
        TallyError::UpstreamUnavailable {
            endpoint, status, ..
        } => {
            assert_eq!(endpoint, "download");
            assert_eq!(status, None);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn session_passes_arguments_through() {
    let (session, controller) = session("us4", Duration::from_secs(5));
    let range = fixtures::scenario_range();

    let ids = session
        .list_feature_ids(ProductType::Cloud)
        .await
        .expect("features");
    let job = session.submit_job(&ids, &range).await.expect("submit");

    assert_eq!(job, fixtures::job_id(ProductType::Cloud));
    assert_eq!(controller.submits().await, vec![(vec![301, 302], range)]);
    assert_eq!(session.name(), "us4");
    assert_eq!(session.credentials().stats().hits, 1);
}
