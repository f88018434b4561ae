use tally_core::transform::{Cleaning, TransformOptions, render};
use tally_core::{
    JobId, OutputFormat, ProductReport, ProductType, RawReport, ReportRequest, Table, TallyError,
};

use crate::Tally;

impl Tally {
    /// Produce one product's report for one client.
    ///
    /// Behavior and trade-offs:
    /// - Runs the job to completion (see [`Tally::run_job`]), then keeps only
    ///   the client's rows with a non-zero metric.
    /// - JSON rows are pruned of empty values; delimited text and spreadsheets
    ///   keep every upstream column.
    ///
    /// # Errors
    /// Job failures from [`Tally::run_job`], `Configuration` when the payload
    /// has no client identifier or metric field, `Transform` for unreadable payloads.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tally::report::generate",
            skip(self, request),
            fields(product = %product, format = %request.format),
        )
    )]
    pub async fn generate(
        &self,
        product: ProductType,
        request: &ReportRequest,
    ) -> Result<ProductReport, TallyError> {
        let done = self.run_job(product, &request.range).await?;
        let table = Table::from_payload(&done.payload)?;
        let (count, data) = self
            .transform_for(&request.client_id)
            .apply(table, request.format)?;
        #[cfg(feature = "tracing")]
        tracing::info!(job_id = %done.job.id, count, "report ready");
        Ok(ProductReport {
            job_id: done.job.id,
            product,
            phase: done.job.phase,
            count,
            data,
        })
    }

    /// Download an existing job's payload without filtering or cleaning it.
    ///
    /// # Errors
    /// `InvalidArg` for a blank identifier, upstream failures, or `Transform`
    /// when the payload cannot be read as a table.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "tally::report::fetch_raw", skip(self), fields(job_id = %job_id))
    )]
    pub async fn fetch_raw(
        &self,
        job_id: &JobId,
        format: OutputFormat,
    ) -> Result<RawReport, TallyError> {
        if job_id.as_str().trim().is_empty() {
            return Err(TallyError::InvalidArg(
                "job identifier must not be empty".into(),
            ));
        }
        let payload = self.session.download(job_id).await?;
        let table = Table::from_payload(&payload)?;
        let count = table.len();
        let options = TransformOptions::from(&self.cfg);
        Ok(RawReport {
            job_id: job_id.clone(),
            count,
            data: render(table, format, &options, Cleaning::Raw)?,
        })
    }
}
