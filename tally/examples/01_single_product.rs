mod common;

use tally::{DateRange, OutputFormat, ProductType, RenderedReport, ReportRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Build the orchestrator (mock in CI when TALLY_EXAMPLES_USE_MOCK is set).
    let tally = common::builder()?.build()?;

    // 2. Describe whose rows we want and for which period.
    let request = ReportRequest::new(
        "829449",
        DateRange::parse("2025-09-01", "2025-09-24")?,
        OutputFormat::Csv,
    )?;

    // 3. Submit, poll, download and filter the CLOUD report.
    let report = tally.generate(ProductType::Cloud, &request).await?;

    // 4. Print the result.
    println!("job {} produced {} row(s)", report.job_id, report.count);
    if let RenderedReport::Csv(text) = report.data {
        print!("{text}");
    }

    Ok(())
}
