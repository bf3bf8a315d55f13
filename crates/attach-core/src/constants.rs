use std::time::Duration;

pub const CONTENT_TYPE_DUCKDB: &str = "application/octet-stream";

pub const DEFAULT_BUCKET: &str = "test-bucket";
pub const DEFAULT_OBJECT: &str = "database.duckdb";

/// Rows written by the populator and expected back through the remote attach.
pub const DEFAULT_ROW_COUNT: u64 = 10_000;

pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(3600);

pub const REMOTE_ALIAS: &str = "remote";
pub const USERS_TABLE: &str = "users";

/// MinIO release the reproduction is pinned to.
pub const MINIO_IMAGE_TAG: &str = "RELEASE.2024-04-18T19-09-19Z";
pub const MINIO_DEFAULT_USER: &str = "minioadmin";
pub const MINIO_DEFAULT_PASSWORD: &str = "minioadmin";
pub const MINIO_API_PORT: u16 = 9000;
