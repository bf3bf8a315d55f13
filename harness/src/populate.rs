use anyhow::Context;
use attach_core::populate;
use std::path::Path;

/// Populate a database file at `path`, replacing whatever is there.
pub async fn run(path: &Path, rows: u64) -> anyhow::Result<()> {
    let written = populate::populate_database(path, rows)
        .await
        .with_context(|| format!("populate {}", path.display()))?;

    tracing::info!(
        event = "harness.populate.done",
        path = %path.display(),
        rows = written,
        "database populated"
    );
    println!("populated path={} rows={written}", path.display());
    Ok(())
}
