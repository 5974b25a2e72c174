//! HTTP(S) backend

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CACHE_CONTROL, ETAG, LAST_MODIFIED, USER_AGENT};
use std::time::Duration;

use super::{SourceBackend, SourceImage};
use crate::codec::ImageType;
use crate::constants::user_agent;
use crate::error::DimsError;

/// Downloads `http://` and `https://` sources
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new() -> Result<Self, DimsError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DimsError::internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

fn header(headers: &HeaderMap, name: impl reqwest::header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl SourceBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    fn can_handle(&self, url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://")
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<SourceImage, DimsError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DimsError::timeout(format!("Timeout downloading {}", url))
                } else {
                    DimsError::bad_request(format!("failed to fetch image from {}: {}", url, e))
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(DimsError::status(
                status,
                format!("failed to fetch image from {}", url),
            ));
        }

        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                DimsError::timeout(format!("Timeout downloading {}", url))
            } else {
                DimsError::internal(format!("Failed to read HTTP body: {}", e))
            }
        })?;

        Ok(SourceImage {
            size: bytes.len(),
            format: ImageType::detect(&bytes),
            status,
            cache_control: header(&headers, CACHE_CONTROL),
            edge_control: header(&headers, "edge-control"),
            last_modified: header(&headers, LAST_MODIFIED),
            etag: header(&headers, ETAG),
            bytes,
        })
    }
}
