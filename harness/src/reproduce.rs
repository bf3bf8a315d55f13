use crate::config::HarnessConfig;
use anyhow::Context;
use attach_core::{s3::S3Publisher, workflow};

/// Run the full reproduction against the configured endpoint and print the report as JSON.
pub async fn run(cfg: &HarnessConfig) -> anyhow::Result<()> {
    let publisher = S3Publisher::connect(&cfg.storage()).await;
    let scenario = cfg.scenario();

    tracing::info!(
        event = "harness.reproduce.started",
        endpoint = %cfg.s3_endpoint,
        location = %scenario.location(),
        rows = scenario.rows,
        "reproduction started"
    );

    let report = workflow::run(&publisher, &scenario, cfg.http())
        .await
        .context("remote attach reproduction")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("encode report")?
    );
    Ok(())
}
