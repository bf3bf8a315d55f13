use crate::config::HarnessConfig;
use anyhow::Context;
use attach_core::{
    attach::{self, AttachRequest},
    redact_query,
};

/// Attach `url` in a fresh session and check the users count against the configured row count.
pub async fn run(cfg: &HarnessConfig, url: String) -> anyhow::Result<()> {
    let redacted = redact_query(&url);
    let scenario = cfg.scenario();
    let req = AttachRequest {
        source: url,
        alias: scenario.alias,
        table: scenario.table,
        expected: scenario.rows,
    };

    let verification = attach::verify_remote_count(req, cfg.http())
        .await
        .with_context(|| format!("attach {redacted}"))?;
    verification.ensure_matches()?;

    println!("verified rows={}", verification.observed);
    Ok(())
}
