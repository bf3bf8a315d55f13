use crate::{constants::USERS_TABLE, Error, Result};
use anyhow::Context;
use duckdb::{AccessMode, Config, Connection};
use std::{
    io,
    path::{Path, PathBuf},
};
use tempfile::TempPath;

/// A populated database file on local disk.
///
/// The file is removed when this value drops.
#[derive(Debug)]
pub struct DatabaseFile {
    path: TempPath,
    rows: u64,
}

impl DatabaseFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Row count read back from the file after population.
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

/// Create a temp `.duckdb` file holding a `users` table with `rows` rows.
pub async fn populate_temp_database(rows: u64) -> Result<DatabaseFile> {
    let placeholder = tempfile::Builder::new()
        .prefix("test_db")
        .suffix(".duckdb")
        .tempfile()
        .context("create temp database file")?;
    let path = placeholder.into_temp_path();
    let target: PathBuf = path.to_path_buf();

    let written = populate_database(&target, rows).await?;

    tracing::debug!(
        event = "attach.populate.done",
        path = %path.display(),
        rows = written,
        "database populated"
    );

    Ok(DatabaseFile {
        path,
        rows: written,
    })
}

/// Populate a database at `target` off the async runtime and return the row count read back.
///
/// Fails when the file does not hold exactly `rows` rows afterwards.
pub async fn populate_database(target: &Path, rows: u64) -> Result<u64> {
    let target = target.to_path_buf();
    let written = tokio::task::spawn_blocking(move || -> Result<u64> {
        create_database(&target, rows)?;
        count_local_rows(&target)
    })
    .await
    .context("join populate worker")??;

    if written != rows {
        return Err(Error::msg(format!(
            "populated database holds {written} rows, expected {rows}"
        )));
    }
    Ok(written)
}

/// Create a new database at `target` and fill the users table.
///
/// Anything already at `target` is removed first so DuckDB initialises a fresh file instead of
/// opening the placeholder. The connection is closed before returning.
pub fn create_database(target: &Path, rows: u64) -> Result<()> {
    match std::fs::remove_file(target) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(anyhow::Error::new(err)
                .context(format!("remove placeholder {}", target.display()))
                .into())
        }
    }

    let conn = Connection::open(target)
        .with_context(|| format!("open duckdb file {}", target.display()))?;
    conn.execute_batch(&users_table_sql(rows))
        .context("create users table")?;
    conn.close()
        .map_err(|(_, err)| err)
        .context("close populated database")?;
    Ok(())
}

/// Count rows in the users table of a local database file, opened read-only.
pub fn count_local_rows(path: &Path) -> Result<u64> {
    let config = Config::default()
        .access_mode(AccessMode::ReadOnly)
        .context("read-only duckdb config")?;
    let conn = Connection::open_with_flags(path, config)
        .with_context(|| format!("open duckdb file {}", path.display()))?;
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {USERS_TABLE}"), [], |row| {
            row.get(0)
        })
        .context("count local rows")?;
    conn.close()
        .map_err(|(_, err)| err)
        .context("close local database")?;
    Ok(u64::try_from(count).context("negative row count")?)
}

fn users_table_sql(rows: u64) -> String {
    format!(
        r#"
        CREATE TABLE {USERS_TABLE} AS
        SELECT
            row_number() OVER () AS id,
            md5(random()::VARCHAR) AS name
        FROM range({rows});
        "#
    )
}
