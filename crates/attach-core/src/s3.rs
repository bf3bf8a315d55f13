use crate::{
    BucketStatus, ObjectLocation, Publisher, Result, SignedUrl, StorageConfig, UploadReceipt,
};
use anyhow::Context;
use async_trait::async_trait;
use aws_config::{retry::RetryConfig, BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{presigning::PresigningConfig, primitives::ByteStream};
use chrono::Utc;
use std::{path::Path, time::Duration};

/// [`Publisher`] backed by the AWS S3 SDK, configured for path-style access so it works against
/// MinIO as well as S3.
#[derive(Debug, Clone)]
pub struct S3Publisher {
    client: aws_sdk_s3::Client,
}

impl S3Publisher {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Build a client for `storage`. SDK retries are disabled: every call is sent once.
    pub async fn connect(storage: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            storage.access_key.clone(),
            storage.secret_key.clone(),
            None,
            None,
            "attach-core",
        );
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(&storage.endpoint)
            .credentials_provider(credentials)
            .region(Region::new(storage.region.clone()))
            .retry_config(RetryConfig::disabled())
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        tracing::debug!(
            event = "attach.s3.client.ready",
            endpoint = %storage.endpoint,
            region = %storage.region,
            "s3 client configured"
        );

        Self::new(aws_sdk_s3::Client::from_conf(s3_config))
    }
}

#[async_trait]
impl Publisher for S3Publisher {
    async fn ensure_bucket(&self, bucket: &str) -> Result<BucketStatus> {
        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(BucketStatus::Created),
            Err(err) => {
                let err = err.into_service_error();
                if err.is_bucket_already_owned_by_you() {
                    tracing::info!(
                        event = "attach.s3.bucket.exists",
                        bucket,
                        "bucket already owned by caller"
                    );
                    return Ok(BucketStatus::AlreadyOwned);
                }
                Err(anyhow::Error::new(err)
                    .context(format!("s3 CreateBucket bucket={bucket}"))
                    .into())
            }
        }
    }

    async fn upload_file(
        &self,
        location: &ObjectLocation,
        path: &Path,
        content_type: &str,
    ) -> Result<UploadReceipt> {
        let bytes = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("stat {}", path.display()))?
            .len();
        let body = ByteStream::from_path(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;

        let resp = self
            .client
            .put_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .with_context(|| {
                format!(
                    "s3 PutObject bucket={} key={}",
                    location.bucket, location.key
                )
            })?;

        Ok(UploadReceipt {
            location: location.clone(),
            bytes,
            e_tag: resp.e_tag().map(str::to_string),
        })
    }

    async fn presign_get(&self, location: &ObjectLocation, expiry: Duration) -> Result<SignedUrl> {
        let issued_at = Utc::now();
        let presigning = PresigningConfig::expires_in(expiry).context("presigning config")?;
        let req = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .presigned(presigning)
            .await
            .with_context(|| {
                format!(
                    "s3 presign GetObject bucket={} key={}",
                    location.bucket, location.key
                )
            })?;

        let expires_at =
            issued_at + chrono::Duration::from_std(expiry).context("convert url expiry")?;
        Ok(SignedUrl {
            url: req.uri().to_string(),
            location: location.clone(),
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{BufRead, BufReader, Read, Write},
        net::TcpListener,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    const INTERNAL_ERROR_BODY: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
        <Error><Code>InternalError</Code><Message>injected failure</Message></Error>";

    /// Serve `500 InternalError` to every request on a local port and count the requests.
    fn spawn_failing_endpoint() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
        let addr = listener.local_addr().expect("listener addr");
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

                let mut content_length = 0usize;
                let mut line = String::new();
                loop {
                    line.clear();
                    if reader.read_line(&mut line).unwrap_or(0) == 0 {
                        break;
                    }
                    let header = line.trim_end();
                    if header.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = header.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap_or(0);
                        }
                    }
                }
                let mut body = vec![0u8; content_length];
                let _ = reader.read_exact(&mut body);

                counter.fetch_add(1, Ordering::SeqCst);
                let resp = format!(
                    "HTTP/1.1 500 Internal Server Error\r\n\
                     Content-Type: application/xml\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{}",
                    INTERNAL_ERROR_BODY.len(),
                    INTERNAL_ERROR_BODY
                );
                let _ = stream.write_all(resp.as_bytes());
                let _ = stream.flush();
            }
        });

        (format!("http://{addr}"), requests)
    }

    fn storage(endpoint: String) -> StorageConfig {
        StorageConfig {
            endpoint,
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    #[tokio::test]
    async fn server_errors_are_not_retried() {
        let (endpoint, requests) = spawn_failing_endpoint();
        let publisher = S3Publisher::connect(&storage(endpoint)).await;

        let res = publisher.ensure_bucket("test-bucket").await;

        assert!(res.is_err(), "create bucket against failing endpoint: {res:?}");
        assert_eq!(requests.load(Ordering::SeqCst), 1, "CreateBucket was resent");
    }

    #[tokio::test]
    async fn upload_is_sent_once() {
        let (endpoint, requests) = spawn_failing_endpoint();
        let publisher = S3Publisher::connect(&storage(endpoint)).await;
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"duckdb bytes").unwrap();

        let res = publisher
            .upload_file(
                &ObjectLocation::new("test-bucket", "database.duckdb"),
                file.path(),
                "application/octet-stream",
            )
            .await;

        assert!(res.is_err());
        assert_eq!(requests.load(Ordering::SeqCst), 1, "PutObject was resent");
    }
}
