use std::time::Duration;

use tally_core::connector::{IdentityProvider, ReportingApi};
use tally_core::{JobState, ProductType, TallyError};
use tally_mock::fixtures::{self, scenario_range};
use tally_mock::{MockBehavior, MockConnector, ScriptedConnector, status};

#[tokio::test]
async fn static_mock_serves_fixture_pipeline() {
    let mock = MockConnector::new();
    let cred = mock.login().await.expect("login");
    let ids = mock
        .list_feature_ids(&cred, ProductType::Cloud)
        .await
        .expect("features");
    assert_eq!(ids, vec![301, 302]);
    let job = mock
        .submit_job(&cred, &ids, &scenario_range())
        .await
        .expect("submit");
    assert_eq!(job.as_str(), "mock-cloud-job");
    let st = mock.get_status(&cred, &job).await.expect("status");
    assert_eq!(st.state, JobState::Ready);
    let payload = mock.download(&cred, &job).await.expect("download");
    assert!(payload.is_csv());
    assert_eq!(payload.bytes, fixtures::cloud_csv().as_bytes());
}

#[tokio::test]
async fn static_mock_rejects_foreign_token() {
    let mock = MockConnector::new();
    let cred = tally_core::Credential::issued_now("stolen", Duration::from_secs(60));
    let err = mock
        .list_feature_ids(&cred, ProductType::Cdn)
        .await
        .expect_err("auth");
    assert!(err.is_auth());
}

#[tokio::test]
async fn scripted_status_queue_then_fallback() {
    let (mock, controller) = ScriptedConnector::new_with_controller("S0");
    let job = fixtures::job_id(ProductType::Cdn);
    controller
        .push_statuses(
            &job,
            [
                MockBehavior::Return(status("queued")),
                MockBehavior::Fail(TallyError::unavailable("status", "reset")),
            ],
        )
        .await;

    let cred = mock.login().await.expect("login");
    let first = mock.get_status(&cred, &job).await.expect("first");
    assert_eq!(first.state, JobState::Pending);
    let second = mock.get_status(&cred, &job).await.expect_err("second");
    assert!(second.is_transient());
    let third = mock.get_status(&cred, &job).await.expect("third");
    assert_eq!(third.state, JobState::Ready);
    assert_eq!(controller.status_calls(&job).await, 3);
}

#[tokio::test]
async fn scripted_logins_issue_distinct_tokens() {
    let (mock, controller) = ScriptedConnector::new_with_controller("S1");
    let a = mock.login().await.expect("a");
    let b = mock.login().await.expect("b");
    assert_ne!(a.token(), b.token());
    assert_eq!(controller.logins().await, 2);
}

#[tokio::test]
async fn scripted_features_override_and_log() {
    let (mock, controller) = ScriptedConnector::new_with_controller("S2");
    controller
        .set_features(ProductType::Waap, MockBehavior::Return(vec![]))
        .await;
    let cred = mock.login().await.expect("login");
    let ids = mock
        .list_feature_ids(&cred, ProductType::Waap)
        .await
        .expect("features");
    assert!(ids.is_empty());
    assert_eq!(controller.feature_calls().await, vec![ProductType::Waap]);
    assert_eq!(controller.tokens_seen().await, vec![cred.token().to_string()]);
}

#[tokio::test(start_paused = true)]
async fn scripted_hang_never_answers() {
    let (mock, controller) = ScriptedConnector::new_with_controller("S3");
    let job = fixtures::job_id(ProductType::Cloud);
    controller.set_download(&job, MockBehavior::Hang).await;
    let cred = mock.login().await.expect("login");
    let res = tokio::time::timeout(Duration::from_secs(5), mock.download(&cred, &job)).await;
    assert!(res.is_err());
    assert_eq!(controller.downloads(&job).await, 1);
}
