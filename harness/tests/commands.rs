//! Subcommand entry points that run without Docker or network access.

use anyhow::Context;
use attach_core::populate::count_local_rows;
use attach_harness::{config::HarnessConfig, populate, publish, verify};
use clap::Parser;

fn config(rows: u64) -> HarnessConfig {
    HarnessConfig::parse_from(["attach-harness", "--row-count", rows.to_string().as_str()])
}

#[tokio::test]
async fn populate_writes_requested_rows_at_path() -> anyhow::Result<()> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("cli.duckdb");
    std::fs::write(&path, b"placeholder").context("write placeholder")?;

    populate::run(&path, 250).await?;

    let rows = count_local_rows(&path)?;
    anyhow::ensure!(rows == 250, "expected 250 rows, got {rows}");
    Ok(())
}

#[tokio::test]
async fn populate_into_missing_directory_fails() -> anyhow::Result<()> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("missing").join("cli.duckdb");

    let res = populate::run(&path, 10).await;
    anyhow::ensure!(res.is_err(), "populate into missing directory succeeded");
    Ok(())
}

#[tokio::test]
async fn verify_accepts_local_database_with_configured_rows() -> anyhow::Result<()> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("cli.duckdb");
    populate::run(&path, 75).await?;

    verify::run(&config(75), path.to_string_lossy().into_owned()).await?;
    Ok(())
}

#[tokio::test]
async fn verify_rejects_row_count_mismatch() -> anyhow::Result<()> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("cli.duckdb");
    populate::run(&path, 75).await?;

    let err = match verify::run(&config(76), path.to_string_lossy().into_owned()).await {
        Ok(()) => anyhow::bail!("verify accepted a mismatched row count"),
        Err(err) => format!("{err:#}"),
    };
    anyhow::ensure!(err.contains("expected 76, observed 75"), "unexpected error: {err}");
    Ok(())
}

#[tokio::test]
async fn publish_requires_existing_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("absent.duckdb");

    let err = match publish::run(&config(10), &path).await {
        Ok(()) => anyhow::bail!("publish of a missing file succeeded"),
        Err(err) => err.to_string(),
    };
    anyhow::ensure!(err.contains("no database file"), "unexpected error: {err}");
    Ok(())
}
