use crate::{redact_query, Error, Result};
use anyhow::Context;
use duckdb::Connection;
use serde::Serialize;

/// HTTP settings applied to the verifying session once `httpfs` is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    /// `0` keeps a failed range read a failed attach.
    pub retries: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retries: 0,
        }
    }
}

/// What to attach and what to expect from it.
#[derive(Clone)]
pub struct AttachRequest {
    /// HTTP(S) URL or local path of a DuckDB database file.
    pub source: String,
    pub alias: String,
    pub table: String,
    pub expected: u64,
}

impl std::fmt::Debug for AttachRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachRequest")
            .field("source", &redact_query(&self.source))
            .field("alias", &self.alias)
            .field("table", &self.table)
            .field("expected", &self.expected)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub expected: u64,
    pub observed: u64,
}

impl Verification {
    pub fn matches(&self) -> bool {
        self.expected == self.observed
    }

    pub fn ensure_matches(&self) -> Result<()> {
        if self.matches() {
            return Ok(());
        }
        Err(Error::msg(format!(
            "remote row count mismatch: expected {}, observed {}",
            self.expected, self.observed
        )))
    }
}

/// Attach `req.source` in a fresh in-memory session and count rows in `req.table`.
///
/// The session never shares state with the one that wrote the file. A count that differs from
/// `req.expected` is returned, not raised; call [`Verification::ensure_matches`] to fail on it.
pub async fn verify_remote_count(req: AttachRequest, http: HttpSettings) -> Result<Verification> {
    let expected = req.expected;
    let observed = tokio::task::spawn_blocking(move || count_attached_rows(&req, http))
        .await
        .context("join attach worker")??;

    let verification = Verification { expected, observed };
    tracing::info!(
        event = "attach.verify.counted",
        expected,
        observed,
        matches = verification.matches(),
        "remote attach counted rows"
    );
    Ok(verification)
}

fn count_attached_rows(req: &AttachRequest, http: HttpSettings) -> Result<u64> {
    let conn = Connection::open_in_memory().context("open duckdb in-memory")?;

    if is_http_source(&req.source) {
        load_httpfs(&conn, http).context("load httpfs")?;
    }

    conn.execute_batch(&attach_sql(&req.source, &req.alias))
        .with_context(|| {
            format!(
                "attach {} as {}",
                redact_query(&req.source),
                req.alias
            )
        })?;

    let count: i64 = conn
        .query_row(&count_sql(&req.alias, &req.table), [], |row| row.get(0))
        .with_context(|| format!("count rows in {}.{}", req.alias, req.table))?;

    conn.close()
        .map_err(|(_, err)| err)
        .context("close verifying session")?;

    Ok(u64::try_from(count).context("negative row count")?)
}

fn load_httpfs(conn: &Connection, http: HttpSettings) -> anyhow::Result<()> {
    conn.execute_batch("INSTALL httpfs;\nLOAD httpfs;")
        .context("install httpfs")?;
    conn.execute_batch(&format!(
        "SET http_timeout={};\nSET http_retries={};",
        http.timeout_secs, http.retries
    ))
    .context("apply http settings")?;
    Ok(())
}

pub fn is_http_source(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn attach_sql(source: &str, alias: &str) -> String {
    format!(
        "ATTACH {} AS {} (READ_ONLY);",
        quote_literal(source),
        quote_ident(alias)
    )
}

fn count_sql(alias: &str, table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}.{}", quote_ident(alias), quote_ident(table))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_ident(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
