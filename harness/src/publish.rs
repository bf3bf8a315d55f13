use crate::config::HarnessConfig;
use anyhow::Context;
use attach_core::{s3::S3Publisher, workflow};
use std::path::Path;

/// Upload an existing database file and print its signed URL.
///
/// The URL is printed in full on purpose so it can be passed to `verify`; it is never logged.
pub async fn run(cfg: &HarnessConfig, path: &Path) -> anyhow::Result<()> {
    anyhow::ensure!(path.is_file(), "no database file at {}", path.display());

    let publisher = S3Publisher::connect(&cfg.storage()).await;
    let signed = workflow::publish(&publisher, &cfg.scenario(), path)
        .await
        .with_context(|| format!("publish {}", path.display()))?;

    println!("{}", signed.url);
    Ok(())
}
