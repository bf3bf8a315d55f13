use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use attach_harness::{config, populate, publish, reproduce, verify};

#[derive(Parser, Debug)]
#[command(name = "attach-harness")]
#[command(about = "DuckDB remote-attach reproduction over presigned S3 URLs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Populate, upload, sign, attach and count in one run.
    Run,

    /// Populate a database file at a path.
    Populate {
        #[arg(long)]
        path: PathBuf,
    },

    /// Upload an existing database file and print a signed GET URL.
    Publish {
        #[arg(long)]
        path: PathBuf,
    },

    /// Attach a database URL (or path) and check the users row count.
    Verify {
        #[arg(long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,attach_core=debug,attach_harness=debug")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::HarnessConfig::from_env().context("load harness config")?;
    tracing::debug!(config = ?cfg, "harness config loaded");

    match cli.command {
        Command::Run => reproduce::run(&cfg).await,
        Command::Populate { path } => populate::run(&path, cfg.row_count).await,
        Command::Publish { path } => publish::run(&cfg, &path).await,
        Command::Verify { url } => verify::run(&cfg, url).await,
    }
}
