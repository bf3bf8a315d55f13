//! Populate → publish → verify, run once and strictly in order.

use crate::{
    attach::{self, AttachRequest, HttpSettings, Verification},
    constants::{
        CONTENT_TYPE_DUCKDB, DEFAULT_BUCKET, DEFAULT_OBJECT, DEFAULT_ROW_COUNT,
        DEFAULT_URL_EXPIRY, REMOTE_ALIAS, USERS_TABLE,
    },
    populate, Error, ObjectLocation, Publisher, Result, SignedUrl,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{path::Path, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Unpopulated,
    /// The database file exists, is uploaded, and a signed URL has been issued.
    Published,
    Verified,
}

impl Stage {
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Unpopulated => Some(Stage::Published),
            Stage::Published => Some(Stage::Verified),
            Stage::Verified => None,
        }
    }

    /// Move to `to`, which must be the immediate successor.
    pub fn advance(self, to: Stage) -> Result<Stage> {
        if self.next() == Some(to) {
            tracing::debug!(event = "attach.workflow.stage", from = ?self, to = ?to, "stage advanced");
            return Ok(to);
        }
        Err(Error::msg(format!("invalid stage transition {self:?} -> {to:?}")))
    }
}

/// Fixed parameters of one reproduction run.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub bucket: String,
    pub object: String,
    pub rows: u64,
    pub expiry: Duration,
    pub alias: String,
    pub table: String,
    pub content_type: String,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            object: DEFAULT_OBJECT.to_string(),
            rows: DEFAULT_ROW_COUNT,
            expiry: DEFAULT_URL_EXPIRY,
            alias: REMOTE_ALIAS.to_string(),
            table: USERS_TABLE.to_string(),
            content_type: CONTENT_TYPE_DUCKDB.to_string(),
        }
    }
}

impl Scenario {
    pub fn location(&self) -> ObjectLocation {
        ObjectLocation::new(&self.bucket, &self.object)
    }

    pub fn attach_request(&self, signed: &SignedUrl) -> AttachRequest {
        AttachRequest {
            source: signed.url.clone(),
            alias: self.alias.clone(),
            table: self.table.clone(),
            expected: self.rows,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub stage: Stage,
    pub rows_written: u64,
    pub location: ObjectLocation,
    pub expires_at: DateTime<Utc>,
    pub verification: Verification,
}

/// Ensure the bucket, upload `file`, and presign a GET for it.
pub async fn publish(
    publisher: &dyn Publisher,
    scenario: &Scenario,
    file: &Path,
) -> Result<SignedUrl> {
    let location = scenario.location();

    let bucket_status = publisher.ensure_bucket(&location.bucket).await?;
    let receipt = publisher
        .upload_file(&location, file, &scenario.content_type)
        .await?;
    tracing::info!(
        event = "attach.publish.uploaded",
        bucket = %receipt.location.bucket,
        key = %receipt.location.key,
        bytes = receipt.bytes,
        e_tag = receipt.e_tag.as_deref().unwrap_or_default(),
        bucket_status = ?bucket_status,
        "database uploaded"
    );

    let signed = publisher.presign_get(&location, scenario.expiry).await?;
    tracing::info!(
        event = "attach.publish.signed",
        location = %signed.location,
        expires_at = %signed.expires_at,
        "signed url issued"
    );
    Ok(signed)
}

/// Run the whole reproduction once.
///
/// Any error from any step aborts the run; a row count mismatch is an error too.
pub async fn run(
    publisher: &dyn Publisher,
    scenario: &Scenario,
    http: HttpSettings,
) -> Result<Report> {
    let mut stage = Stage::Unpopulated;

    let database = populate::populate_temp_database(scenario.rows).await?;
    let signed = publish(publisher, scenario, database.path()).await?;
    stage = stage.advance(Stage::Published)?;

    let verification = attach::verify_remote_count(scenario.attach_request(&signed), http).await?;
    verification.ensure_matches()?;
    stage = stage.advance(Stage::Verified)?;

    tracing::info!(
        event = "attach.workflow.verified",
        rows = verification.observed,
        "remote attach returned the written row count"
    );

    Ok(Report {
        stage,
        rows_written: database.rows(),
        location: signed.location,
        expires_at: signed.expires_at,
        verification,
    })
}
