use attach_core::{
    attach::HttpSettings,
    constants::{
        CONTENT_TYPE_DUCKDB, DEFAULT_BUCKET, DEFAULT_OBJECT, DEFAULT_ROW_COUNT, REMOTE_ALIAS,
        USERS_TABLE,
    },
    workflow::Scenario,
    StorageConfig,
};
use clap::Parser;
use std::time::Duration;

/// Harness configuration.
///
/// Parsed once at startup and passed through as `&HarnessConfig`. Defaults match a local MinIO
/// started with its stock credentials and the literals of the reproduction scenario.
#[derive(Parser, Clone)]
pub struct HarnessConfig {
    /// MinIO/S3 endpoint.
    #[arg(long, env = "S3_ENDPOINT", default_value = "http://localhost:9000")]
    pub s3_endpoint: String,

    #[arg(long, env = "S3_ACCESS_KEY", default_value = "minioadmin")]
    pub s3_access_key: String,

    #[arg(long, env = "S3_SECRET_KEY", default_value = "minioadmin")]
    pub s3_secret_key: String,

    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    pub s3_region: String,

    #[arg(long, env = "S3_BUCKET", default_value = DEFAULT_BUCKET)]
    pub s3_bucket: String,

    /// Object key the database file is uploaded under.
    #[arg(long, env = "S3_OBJECT", default_value = DEFAULT_OBJECT)]
    pub s3_object: String,

    /// Rows written by the populator and expected back from the remote attach.
    #[arg(long, env = "ROW_COUNT", default_value_t = DEFAULT_ROW_COUNT)]
    pub row_count: u64,

    /// Signed URL lifetime in seconds.
    #[arg(long, env = "URL_EXPIRY_SECS", default_value_t = 3600)]
    pub url_expiry_secs: u64,

    #[arg(long, env = "DUCKDB_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub duckdb_http_timeout_secs: u64,

    #[arg(long, env = "DUCKDB_HTTP_RETRIES", default_value_t = 0)]
    pub duckdb_http_retries: u32,
}

impl std::fmt::Debug for HarnessConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarnessConfig")
            .field("s3_endpoint", &self.s3_endpoint)
            .field("s3_access_key", &self.s3_access_key)
            .field("s3_secret_key", &"<redacted>")
            .field("s3_region", &self.s3_region)
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_object", &self.s3_object)
            .field("row_count", &self.row_count)
            .field("url_expiry_secs", &self.url_expiry_secs)
            .field("duckdb_http_timeout_secs", &self.duckdb_http_timeout_secs)
            .field("duckdb_http_retries", &self.duckdb_http_retries)
            .finish()
    }
}

impl HarnessConfig {
    /// Parse config from environment only (no CLI parsing).
    ///
    /// A single fake argv element keeps clap from interpreting the subcommand flags here.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::parse_from(["attach-harness"]))
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig {
            endpoint: self.s3_endpoint.clone(),
            access_key: self.s3_access_key.clone(),
            secret_key: self.s3_secret_key.clone(),
            region: self.s3_region.clone(),
        }
    }

    pub fn scenario(&self) -> Scenario {
        Scenario {
            bucket: self.s3_bucket.clone(),
            object: self.s3_object.clone(),
            rows: self.row_count,
            expiry: Duration::from_secs(self.url_expiry_secs),
            alias: REMOTE_ALIAS.to_string(),
            table: USERS_TABLE.to_string(),
            content_type: CONTENT_TYPE_DUCKDB.to_string(),
        }
    }

    pub fn http(&self) -> HttpSettings {
        HttpSettings {
            timeout_secs: self.duckdb_http_timeout_secs,
            retries: self.duckdb_http_retries,
        }
    }
}
