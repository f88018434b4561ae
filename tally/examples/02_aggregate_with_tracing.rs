mod common;

use tally::{DateRange, OutputFormat, ReportRequest};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Spans and events are emitted when the crate is built with `--features tracing`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tally=debug")),
        )
        .init();

    let tally = common::builder()?.build()?;
    let request = ReportRequest::new(
        "829449",
        DateRange::parse("2025-09-01", "2025-09-24")?,
        OutputFormat::Json,
    )?;

    let all = tally.aggregate(request).run().await?;

    println!("{} merged row(s)", all.count);
    for summary in &all.products {
        println!("  {}: {} row(s) from job {}", summary.product, summary.count, summary.job_id);
    }
    for failure in &all.failed {
        println!("  {} excluded: {}", failure.product, failure.error);
    }
    println!("{}", serde_json::to_string_pretty(&all.data)?);

    Ok(())
}
