//! S3 backend

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::{SourceBackend, SourceImage};
use crate::codec::ImageType;
use crate::config::S3Config;
use crate::constants::HTTP_DATE_FORMAT;
use crate::error::DimsError;

/// Reads objects with the AWS SDK
///
/// The SDK client is built on first use from the default credential chain.
#[derive(Debug)]
pub struct S3Backend {
    config: S3Config,
    client: OnceCell<S3Client>,
}

impl S3Backend {
    pub fn new(config: S3Config) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Use an existing SDK client
    pub fn with_client(config: S3Config, client: S3Client) -> Self {
        Self {
            config,
            client: OnceCell::new_with(Some(client)),
        }
    }

    async fn client(&self) -> &S3Client {
        self.client
            .get_or_init(|| async {
                let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
                if let Some(region) = &self.config.region {
                    loader = loader.region(aws_config::Region::new(region.clone()));
                }
                S3Client::new(&loader.load().await)
            })
            .await
    }

    /// Split a source URL into `(bucket, key)`
    pub fn locate(&self, url: &str) -> Result<(String, String), DimsError> {
        if let Some(rest) = url.strip_prefix("s3://") {
            let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
            let key = key.trim_start_matches('/');
            if bucket.is_empty() || key.is_empty() {
                return Err(DimsError::bad_request(format!(
                    "Invalid S3 source: {}. Expected s3://bucket/key",
                    url
                )));
            }
            return Ok((bucket.to_string(), key.to_string()));
        }

        let bucket = self
            .config
            .bucket
            .clone()
            .ok_or_else(|| DimsError::bad_request("No S3 bucket configured for bare keys"))?;

        let key = url.trim_matches('/');
        let key = match self.config.prefix.as_deref().map(|p| p.trim_matches('/')) {
            Some(prefix) if !prefix.is_empty() => format!("{}/{}", prefix, key),
            _ => key.to_string(),
        };

        Ok((bucket, key))
    }
}

#[async_trait]
impl SourceBackend for S3Backend {
    fn name(&self) -> &'static str {
        "s3"
    }

    fn can_handle(&self, url: &str) -> bool {
        if url.starts_with("s3://") {
            return true;
        }
        self.config.bucket.is_some()
            && !url.contains("://")
            && !url.starts_with('/')
            && !url.starts_with("./")
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<SourceImage, DimsError> {
        let (bucket, key) = self.locate(url)?;
        tracing::debug!(bucket = %bucket, key = %key, "Fetching S3 object");

        let client = self.client().await;
        let download = async {
            let response = client
                .get_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .map_err(|e| {
                    let not_found = e
                        .as_service_error()
                        .map(|service| service.is_no_such_key())
                        .unwrap_or(false);
                    if not_found {
                        DimsError::status(404, format!("S3 object not found: s3://{}/{}", bucket, key))
                    } else {
                        DimsError::internal(format!("S3 fetch failed: {}", e))
                    }
                })?;

            let etag = response.e_tag().map(str::to_string);
            let cache_control = response.cache_control().map(str::to_string);
            let last_modified = response
                .last_modified()
                .and_then(|dt| chrono::DateTime::from_timestamp(dt.secs(), 0))
                .map(|dt| dt.format(HTTP_DATE_FORMAT).to_string());

            let bytes = response
                .body
                .collect()
                .await
                .map_err(|e| DimsError::internal(format!("Failed to read S3 body: {}", e)))?
                .into_bytes();

            Ok::<_, DimsError>(SourceImage {
                size: bytes.len(),
                format: ImageType::detect(&bytes),
                status: 200,
                cache_control,
                edge_control: None,
                last_modified,
                etag,
                bytes,
            })
        };

        tokio::time::timeout(timeout, download)
            .await
            .map_err(|_| DimsError::timeout(format!("Timeout downloading s3://{}/{}", bucket, key)))?
    }
}
