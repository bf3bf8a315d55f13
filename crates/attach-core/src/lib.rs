//! Core pieces of the remote-attach reproduction.
//!
//! The workflow populates a local DuckDB file, publishes it to S3-compatible storage behind a
//! presigned GET URL, and checks that a fresh DuckDB session can `ATTACH` that URL and read the
//! same row count back.
//!
//! # API notes
//! `attach-core` is an internal crate (`publish = false`). Storage endpoints and credentials are
//! always passed in explicitly as a [`StorageConfig`]; nothing here reads ambient fixture state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fmt, path::Path, time::Duration};

pub mod attach;
pub mod constants;
pub mod populate;
pub mod s3;
pub mod workflow;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    inner: anyhow::Error,
}

impl Error {
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            inner: anyhow::anyhow!(message.into()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `{:#}` keeps the context chain on one line.
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self { inner: value }
    }
}

impl From<duckdb::Error> for Error {
    fn from(value: duckdb::Error) -> Self {
        Self {
            inner: anyhow::Error::from(value),
        }
    }
}

/// Connection details for an S3-compatible endpoint (MinIO in tests).
#[derive(Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketStatus {
    Created,
    /// The service reported the bucket already exists and belongs to the caller.
    AlreadyOwned,
}

#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub location: ObjectLocation,
    pub bytes: u64,
    pub e_tag: Option<String>,
}

/// A time-limited GET capability for one object.
///
/// The URL carries the signature in its query string, so `Debug` never prints it.
#[derive(Clone)]
pub struct SignedUrl {
    pub url: String,
    pub location: ObjectLocation,
    pub expires_at: DateTime<Utc>,
}

impl SignedUrl {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for SignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedUrl")
            .field("url", &redact_query(&self.url))
            .field("location", &self.location)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Replace everything after `?` so signatures and credentials stay out of logs.
pub fn redact_query(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{base}?<redacted>"),
        None => url.to_string(),
    }
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn ensure_bucket(&self, bucket: &str) -> Result<BucketStatus>;

    async fn upload_file(
        &self,
        location: &ObjectLocation,
        path: &Path,
        content_type: &str,
    ) -> Result<UploadReceipt>;

    /// Presign a GET for `location`, valid for `expiry` from now.
    async fn presign_get(&self, location: &ObjectLocation, expiry: Duration) -> Result<SignedUrl>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_signature_query() {
        let url = "http://127.0.0.1:9000/test-bucket/database.duckdb?X-Amz-Signature=abc";
        assert_eq!(
            redact_query(url),
            "http://127.0.0.1:9000/test-bucket/database.duckdb?<redacted>"
        );
        assert_eq!(redact_query("/tmp/db.duckdb"), "/tmp/db.duckdb");
    }

    #[test]
    fn signed_url_debug_hides_credentials() {
        let signed = SignedUrl {
            url: "http://minio/b/k?X-Amz-Credential=minioadmin&X-Amz-Signature=abc".to_string(),
            location: ObjectLocation::new("b", "k"),
            expires_at: Utc::now(),
        };
        let rendered = format!("{signed:?}");
        assert!(!rendered.contains("minioadmin"), "{rendered}");
        assert!(!rendered.contains("abc"), "{rendered}");
    }

    #[test]
    fn storage_config_debug_redacts_secret() {
        let cfg = StorageConfig {
            endpoint: "http://127.0.0.1:9000".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "hunter2".to_string(),
            region: "us-east-1".to_string(),
        };
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }

    #[test]
    fn signed_url_expiry_boundary() {
        let now = Utc::now();
        let signed = SignedUrl {
            url: String::new(),
            location: ObjectLocation::new("b", "k"),
            expires_at: now,
        };
        assert!(signed.is_expired_at(now));
        assert!(!signed.is_expired_at(now - chrono::Duration::seconds(1)));
    }
}
