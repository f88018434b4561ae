use tally_core::{
    DateRange, DownloadedJob, JobId, JobPhase, JobState, JobStatus, ProductType, RawPayload,
    ReportJob, TallyError,
};
use tokio::time::Instant;

use crate::Tally;

impl Tally {
    /// Drive one report job from submission to download.
    ///
    /// Behavior and trade-offs:
    /// - Resolves the product's feature identifiers, submits the job, then polls
    ///   every `poll_interval` until upstream reports it ready.
    /// - A transient status failure is retried on the next tick; a malformed
    ///   status document or any other failure aborts the job.
    /// - The poll ceiling is checked after every query, so the final query lands
    ///   at `poll_timeout` at the latest. No lock is held while sleeping.
    ///
    /// # Errors
    /// - `NoFeaturesConfigured` if upstream lists no features for `product`.
    /// - `ReportGenerationFailed` if upstream marks the job failed.
    /// - `ReportTimeout` if the job is not ready within `poll_timeout`.
    /// - Credential and upstream failures otherwise.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tally::job::run",
            skip(self),
            fields(connector = self.connector_name(), product = %product),
        )
    )]
    pub async fn run_job(
        &self,
        product: ProductType,
        range: &DateRange,
    ) -> Result<DownloadedJob, TallyError> {
        let mut job = self.submit_job(product, range).await?;
        let payload = self.complete_job(&mut job).await?;
        Ok(DownloadedJob { job, payload })
    }

    /// Resolve the product's features and submit one job for `range`.
    ///
    /// # Errors
    /// `NoFeaturesConfigured` if upstream lists no features for `product`,
    /// otherwise credential and upstream failures.
    pub async fn submit_job(
        &self,
        product: ProductType,
        range: &DateRange,
    ) -> Result<ReportJob, TallyError> {
        let features = self.session.list_feature_ids(product).await?;
        if features.is_empty() {
            return Err(TallyError::NoFeaturesConfigured {
                product: product.as_str().to_string(),
            });
        }

        let id = self.session.submit_job(&features, range).await?;
        #[cfg(feature = "tracing")]
        tracing::debug!(job_id = %id, features = features.len(), "report job submitted");
        Ok(ReportJob {
            id,
            product,
            range: *range,
            phase: JobPhase::Submitted,
        })
    }

    /// Poll a submitted job until it is ready, then download it.
    ///
    /// `job.phase` tracks progress and ends in `Downloaded` on success or
    /// `Failed` when polling or the download fails.
    ///
    /// # Errors
    /// `ReportGenerationFailed`, `ReportTimeout`, credential and upstream
    /// failures. Returns `InvalidArg` for a job already in a terminal phase.
    pub async fn complete_job(&self, job: &mut ReportJob) -> Result<RawPayload, TallyError> {
        if job.phase.is_terminal() {
            return Err(TallyError::InvalidArg(format!(
                "job {} is already {:?}",
                job.id, job.phase
            )));
        }
        match self.poll_and_download(job).await {
            Ok(payload) => Ok(payload),
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(job_id = %job.id, phase = ?job.phase, error = %e, "report job failed");
                job.phase = JobPhase::Failed;
                Err(e)
            }
        }
    }

    async fn poll_and_download(&self, job: &mut ReportJob) -> Result<RawPayload, TallyError> {
        job.phase = JobPhase::Polling;
        self.poll_until_ready(&job.id).await?;
        job.phase = JobPhase::Ready;

        let payload = self.session.download(&job.id).await?;
        job.phase = JobPhase::Downloaded;
        #[cfg(feature = "tracing")]
        tracing::debug!(job_id = %job.id, bytes = payload.bytes.len(), "report downloaded");
        Ok(payload)
    }

    /// Query the current status of an existing job.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a blank identifier, otherwise credential and
    /// upstream failures.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "tally::job::status", skip(self), fields(job_id = %job_id))
    )]
    pub async fn job_status(&self, job_id: &JobId) -> Result<JobStatus, TallyError> {
        if job_id.as_str().trim().is_empty() {
            return Err(TallyError::InvalidArg(
                "job identifier must not be empty".into(),
            ));
        }
        self.session.get_status(job_id).await
    }

    pub(crate) async fn poll_until_ready(&self, job_id: &JobId) -> Result<JobStatus, TallyError> {
        let ceiling = self.cfg.poll_timeout;
        let started = Instant::now();
        let mut last_state: Option<String> = None;

        loop {
            match self.session.get_status(job_id).await {
                Ok(status) => match status.state {
                    JobState::Ready => return Ok(status),
                    JobState::Failed => {
                        return Err(TallyError::ReportGenerationFailed {
                            job_id: job_id.to_string(),
                            message: status.message.unwrap_or_else(|| {
                                format!("upstream reported '{}'", status.raw_state)
                            }),
                        });
                    }
                    JobState::Pending | JobState::Running => {
                        last_state = Some(status.raw_state);
                    }
                },
                Err(e) if e.is_transient() => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(job_id = %job_id, error = %e, "status query failed; retrying next tick");
                }
                Err(e) => return Err(e),
            }

            let elapsed = started.elapsed();
            if elapsed >= ceiling {
                return Err(TallyError::ReportTimeout {
                    job_id: job_id.to_string(),
                    elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    last_state: last_state.unwrap_or_else(|| "unknown".to_string()),
                });
            }
            tokio::time::sleep(self.cfg.poll_interval.min(ceiling - elapsed)).await;
        }
    }
}
