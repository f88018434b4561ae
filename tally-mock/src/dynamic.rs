//! Scripted connector whose behavior is steered by a controller at runtime.
//!
//! Each operation has a queue of one-shot behaviors and an optional sticky
//! fallback. A call pops the queue first, then uses the fallback, then the
//! fixture behavior of [`crate::MockConnector`].

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tally_core::connector::{IdentityProvider, ReportingApi, TallyConnector};
use tally_core::{Credential, DateRange, JobId, JobStatus, ProductType, RawPayload, TallyError};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{MOCK_TOKEN, MOCK_VALID_FOR, fixtures};

/// How a scripted call answers.
#[derive(Debug, Clone)]
pub enum MockBehavior<T> {
    /// Answer with the value.
    Return(T),
    /// Answer with the error.
    Fail(TallyError),
    /// Sleep, then answer with the value.
    Delay(Duration, T),
    /// Never answer.
    Hang,
}

struct Script<T> {
    queue: VecDeque<MockBehavior<T>>,
    fallback: Option<MockBehavior<T>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            fallback: None,
        }
    }
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Option<MockBehavior<T>> {
        self.queue.pop_front().or_else(|| self.fallback.clone())
    }
}

#[derive(Default)]
struct InternalState {
    login: Script<Credential>,
    features: HashMap<ProductType, Script<Vec<u64>>>,
    submit: HashMap<ProductType, Script<JobId>>,
    status: HashMap<JobId, Script<JobStatus>>,
    download: HashMap<JobId, Script<RawPayload>>,
    logins: usize,
    feature_calls: Vec<ProductType>,
    submits: Vec<(Vec<u64>, DateRange)>,
    status_calls: HashMap<JobId, Vec<Instant>>,
    downloads: HashMap<JobId, usize>,
    tokens_seen: Vec<String>,
}

/// Handle that scripts and inspects a [`ScriptedConnector`].
#[derive(Clone)]
pub struct ScriptedController {
    state: Arc<Mutex<InternalState>>,
}

impl ScriptedController {
    /// Queue a one-shot login answer.
    pub async fn push_login(&self, behavior: MockBehavior<Credential>) {
        self.state.lock().await.login.queue.push_back(behavior);
    }

    /// Set the login answer used once the queue is drained.
    pub async fn set_login(&self, behavior: MockBehavior<Credential>) {
        self.state.lock().await.login.fallback = Some(behavior);
    }

    /// Set the feature listing answer for a product.
    pub async fn set_features(&self, product: ProductType, behavior: MockBehavior<Vec<u64>>) {
        let mut guard = self.state.lock().await;
        guard.features.entry(product).or_default().fallback = Some(behavior);
    }

    /// Set the submission answer for jobs whose features belong to `product`.
    pub async fn set_submit(&self, product: ProductType, behavior: MockBehavior<JobId>) {
        let mut guard = self.state.lock().await;
        guard.submit.entry(product).or_default().fallback = Some(behavior);
    }

    /// Queue one-shot status answers for a job, in order.
    pub async fn push_statuses(
        &self,
        job_id: &JobId,
        behaviors: impl IntoIterator<Item = MockBehavior<JobStatus>>,
    ) {
        let mut guard = self.state.lock().await;
        guard
            .status
            .entry(job_id.clone())
            .or_default()
            .queue
            .extend(behaviors);
    }

    /// Set the status answer used once the job's queue is drained.
    pub async fn set_status(&self, job_id: &JobId, behavior: MockBehavior<JobStatus>) {
        let mut guard = self.state.lock().await;
        guard.status.entry(job_id.clone()).or_default().fallback = Some(behavior);
    }

    /// Set the download answer for a job.
    pub async fn set_download(&self, job_id: &JobId, behavior: MockBehavior<RawPayload>) {
        let mut guard = self.state.lock().await;
        guard.download.entry(job_id.clone()).or_default().fallback = Some(behavior);
    }

    /// Number of login calls received.
    pub async fn logins(&self) -> usize {
        self.state.lock().await.logins
    }

    /// Products whose features were listed, in call order.
    pub async fn feature_calls(&self) -> Vec<ProductType> {
        self.state.lock().await.feature_calls.clone()
    }

    /// Submissions received, in call order.
    pub async fn submits(&self) -> Vec<(Vec<u64>, DateRange)> {
        self.state.lock().await.submits.clone()
    }

    /// Number of status queries received for a job.
    pub async fn status_calls(&self, job_id: &JobId) -> usize {
        self.status_instants(job_id).await.len()
    }

    /// Instants at which status queries for a job were received.
    pub async fn status_instants(&self, job_id: &JobId) -> Vec<Instant> {
        let guard = self.state.lock().await;
        guard.status_calls.get(job_id).cloned().unwrap_or_default()
    }

    /// Number of downloads received for a job.
    pub async fn downloads(&self, job_id: &JobId) -> usize {
        let guard = self.state.lock().await;
        guard.downloads.get(job_id).copied().unwrap_or_default()
    }

    /// Bearer tokens presented to reporting calls, in call order.
    pub async fn tokens_seen(&self) -> Vec<String> {
        self.state.lock().await.tokens_seen.clone()
    }

    /// Clear all scripts and call logs.
    pub async fn clear_all_behaviors(&self) {
        *self.state.lock().await = InternalState::default();
    }
}

/// A connector that defers all behavior to an external controller.
pub struct ScriptedConnector {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
}

impl ScriptedConnector {
    /// Create a new scripted connector and its controller.
    #[must_use]
    pub fn new_with_controller(name: &'static str) -> (Arc<Self>, ScriptedController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = ScriptedController {
            state: Arc::clone(&state),
        };
        (Arc::new(Self { name, state }), controller)
    }
}

async fn answer<T>(
    behavior: Option<MockBehavior<T>>,
    default: impl FnOnce() -> Result<T, TallyError>,
) -> Result<T, TallyError> {
    match behavior {
        None => default(),
        Some(MockBehavior::Return(v)) => Ok(v),
        Some(MockBehavior::Fail(e)) => Err(e),
        Some(MockBehavior::Delay(d, v)) => {
            tokio::time::sleep(d).await;
            Ok(v)
        }
        Some(MockBehavior::Hang) => std::future::pending().await,
    }
}

#[async_trait]
impl IdentityProvider for ScriptedConnector {
    async fn login(&self) -> Result<Credential, TallyError> {
        // Snapshot the behavior without holding the lock across await points
        let (behavior, n) = {
            let mut guard = self.state.lock().await;
            guard.logins += 1;
            (guard.login.next(), guard.logins)
        };
        answer(behavior, || {
            Ok(Credential::issued_now(
                format!("{MOCK_TOKEN}-{n}"),
                MOCK_VALID_FOR,
            ))
        })
        .await
    }
}

#[async_trait]
impl ReportingApi for ScriptedConnector {
    async fn list_feature_ids(
        &self,
        credential: &Credential,
        product: ProductType,
    ) -> Result<Vec<u64>, TallyError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.tokens_seen.push(credential.token().to_string());
            guard.feature_calls.push(product);
            guard.features.get_mut(&product).and_then(Script::next)
        };
        answer(behavior, || Ok(fixtures::feature_ids(product))).await
    }

    async fn submit_job(
        &self,
        credential: &Credential,
        feature_ids: &[u64],
        range: &DateRange,
    ) -> Result<JobId, TallyError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.tokens_seen.push(credential.token().to_string());
            guard.submits.push((feature_ids.to_vec(), *range));
            match feature_ids
                .first()
                .and_then(|id| fixtures::product_for_feature(*id))
            {
                Some(product) => guard.submit.get_mut(&product).and_then(Script::next),
                None => None,
            }
        };
        answer(behavior, || crate::submit_for(feature_ids)).await
    }

    async fn get_status(
        &self,
        credential: &Credential,
        job_id: &JobId,
    ) -> Result<JobStatus, TallyError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.tokens_seen.push(credential.token().to_string());
            guard
                .status_calls
                .entry(job_id.clone())
                .or_default()
                .push(Instant::now());
            guard.status.get_mut(job_id).and_then(Script::next)
        };
        answer(behavior, || Ok(crate::status("ready"))).await
    }

    async fn download(
        &self,
        credential: &Credential,
        job_id: &JobId,
    ) -> Result<RawPayload, TallyError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.tokens_seen.push(credential.token().to_string());
            *guard.downloads.entry(job_id.clone()).or_default() += 1;
            guard.download.get_mut(job_id).and_then(Script::next)
        };
        answer(behavior, || crate::download_for(job_id)).await
    }
}

impl TallyConnector for ScriptedConnector {
    fn name(&self) -> &'static str {
        self.name
    }
}
