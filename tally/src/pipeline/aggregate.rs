use std::collections::HashSet;

use tally_core::transform::provenance::merge_tagged;
use tally_core::transform::{Cleaning, TransformOptions, render};
use tally_core::{
    AggregateMode, AggregateReport, JobId, ProductFailure, ProductSummary, ProductType,
    ReportRequest, Table, TallyError,
};

use crate::Tally;

type Outcome = (ProductType, Result<(JobId, Table), TallyError>);

/// Builder to merge several product reports into one provenance-tagged report.
pub struct AggregateBuilder<'a> {
    pub(crate) tally: &'a Tally,
    pub(crate) request: ReportRequest,
    pub(crate) products: Vec<ProductType>,
    pub(crate) mode: AggregateMode,
}

impl<'a> AggregateBuilder<'a> {
    /// Create a builder for every product, using the orchestrator's aggregation mode.
    #[must_use]
    pub fn new(tally: &'a Tally, request: ReportRequest) -> Self {
        Self {
            tally,
            request,
            products: ProductType::ALL.to_vec(),
            mode: tally.cfg.aggregate_mode,
        }
    }

    /// Replace the product list. Merged rows follow this order.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an empty list or a repeated product.
    pub fn products(mut self, products: &[ProductType]) -> Result<Self, TallyError> {
        if products.is_empty() {
            return Err(TallyError::InvalidArg(
                "no products specified for aggregation".into(),
            ));
        }
        let mut seen = HashSet::new();
        for p in products {
            if !seen.insert(*p) {
                return Err(TallyError::InvalidArg(format!(
                    "duplicate product '{p}' in products list"
                )));
            }
        }
        self.products = products.to_vec();
        Ok(self)
    }

    /// Run product pipelines concurrently or one at a time.
    #[must_use]
    pub const fn mode(mut self, mode: AggregateMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run every product pipeline and merge the survivors.
    ///
    /// Behavior and trade-offs:
    /// - A failing product is listed in `failed` and contributes no rows; the
    ///   others still merge.
    /// - An authentication failure aborts the whole aggregation, since no
    ///   product can proceed without a credential.
    /// - Every merged row carries the provenance column. Under
    ///   `PreserveUpstream`, an upstream column of the same name is kept and
    ///   the label goes to `<column>_source`.
    ///
    /// # Errors
    /// `Auth` when the credential cannot be obtained or is rejected, or
    /// `Transform` if encoding the merged table fails.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tally::aggregate::run",
            skip(self),
            fields(products = self.products.len(), mode = ?self.mode),
        )
    )]
    pub async fn run(self) -> Result<AggregateReport, TallyError> {
        let outcomes: Vec<Outcome> = match self.mode {
            AggregateMode::Sequential => {
                let mut out = Vec::with_capacity(self.products.len());
                for product in &self.products {
                    let outcome = self.pipeline(*product).await;
                    if let (_, Err(e)) = &outcome
                        && e.is_auth()
                    {
                        return Err(e.clone());
                    }
                    out.push(outcome);
                }
                out
            }
            AggregateMode::Concurrent => {
                let tasks = self.products.iter().map(|p| self.pipeline(*p));
                futures::future::join_all(tasks).await
            }
        };

        let mut parts = Vec::new();
        let mut products = Vec::new();
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (product, result) in outcomes {
            match result {
                Ok((job_id, table)) => {
                    products.push(ProductSummary {
                        product,
                        job_id,
                        count: table.len(),
                    });
                    succeeded.push(product);
                    parts.push((product, table));
                }
                Err(e) if e.is_auth() => return Err(e),
                Err(error) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(product = %product, error = %error, "product excluded from aggregate");
                    failed.push(ProductFailure { product, error });
                }
            }
        }

        let cfg = &self.tally.cfg;
        let merged = merge_tagged(parts, &cfg.provenance_column, cfg.provenance);
        let count = merged.len();
        let options = TransformOptions::from(cfg);
        let data = render(merged, self.request.format, &options, Cleaning::Prune)?;
        Ok(AggregateReport {
            data,
            count,
            products,
            succeeded,
            failed,
        })
    }

    async fn pipeline(&self, product: ProductType) -> Outcome {
        let result = async {
            let done = self.tally.run_job(product, &self.request.range).await?;
            let table = Table::from_payload(&done.payload)?;
            let kept = self
                .tally
                .transform_for(&self.request.client_id)
                .filter(table)?;
            Ok::<_, TallyError>((done.job.id, kept))
        }
        .await;
        (product, result)
    }
}

impl Tally {
    /// Begin building an aggregated report over several products.
    ///
    /// Typical usage: optionally narrow `products` or override `mode`, then call `run()`.
    #[must_use]
    pub fn aggregate(&self, request: ReportRequest) -> AggregateBuilder<'_> {
        AggregateBuilder::new(self, request)
    }
}
