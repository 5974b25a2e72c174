//! Source image backends
//!
//! A backend turns a source URL into bytes plus the upstream caching
//! metadata. Three backends exist:
//!
//! - `file`: local files under `file.base_dir`
//! - `http`: `http://` and `https://` URLs via reqwest
//! - `s3`: `s3://bucket/key` URLs, or bare keys in `s3.bucket`
//!
//! The [`BackendRegistry`] is built once at startup and consulted in
//! registration order.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

use crate::codec::ImageType;
use crate::config::Config;
use crate::error::DimsError;

pub mod file;
pub mod http;
pub mod s3;

pub use file::FileBackend;
pub use http::HttpBackend;
pub use s3::S3Backend;

/// Source bytes and the upstream response metadata
#[derive(Debug, Clone, Default)]
pub struct SourceImage {
    pub bytes: Bytes,
    pub size: usize,
    /// Detected from the bytes, never from a Content-Type header
    pub format: Option<ImageType>,
    pub status: u16,
    pub cache_control: Option<String>,
    pub edge_control: Option<String>,
    pub last_modified: Option<String>,
    pub etag: Option<String>,
}

impl SourceImage {
    /// A 200 response carrying `bytes`
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            size: bytes.len(),
            format: ImageType::detect(&bytes),
            status: 200,
            bytes,
            ..Default::default()
        }
    }
}

/// A named source of image bytes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceBackend: Send + Sync {
    /// Registry name (`file`, `http`, `s3`)
    fn name(&self) -> &'static str;

    /// Whether this backend recognises `url`
    fn can_handle(&self, url: &str) -> bool;

    /// Fetch `url`, failing with a 504 error once `timeout` elapses
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<SourceImage, DimsError>;
}

/// Backends known to the process, in registration order
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn SourceBackend>>,
    /// Backends that exist but were not enabled; used for error reporting
    disabled: Vec<Arc<dyn SourceBackend>>,
    default: Option<String>,
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field(
                "backends",
                &self.backends.iter().map(|b| b.name()).collect::<Vec<_>>(),
            )
            .field("default", &self.default)
            .finish()
    }
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry for `config`
    ///
    /// A backend is registered when it is the default or listed in
    /// `source.allowed`; registration order is `file`, `http`, `s3`.
    pub fn from_config(config: &Config) -> Result<Self, DimsError> {
        let mut registry = BackendRegistry::new();

        let candidates: [Arc<dyn SourceBackend>; 3] = [
            Arc::new(FileBackend::new(&config.file.base_dir)),
            Arc::new(HttpBackend::new()?),
            Arc::new(S3Backend::new(config.s3.clone())),
        ];

        for backend in candidates {
            if config.source.is_enabled(backend.name()) {
                registry.register(backend);
            } else {
                registry.disabled.push(backend);
            }
        }

        registry.set_default(&config.source.default);
        Ok(registry)
    }

    pub fn register(&mut self, backend: Arc<dyn SourceBackend>) {
        tracing::debug!(backend = backend.name(), "Registered source backend");
        self.backends.push(backend);
    }

    /// Name of the backend invoked when nothing claims a URL
    pub fn set_default(&mut self, name: &str) {
        self.default = Some(name.to_string());
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Pick the backend for `url`
    pub fn resolve(&self, url: &str) -> Result<Arc<dyn SourceBackend>, DimsError> {
        if let Some(backend) = self.backends.iter().find(|b| b.can_handle(url)) {
            return Ok(Arc::clone(backend));
        }

        if let Some(backend) = self.disabled.iter().find(|b| b.can_handle(url)) {
            return Err(DimsError::bad_request(format!(
                "Supported image source '{}' is not allowed",
                backend.name()
            )));
        }

        if let Some(default) = &self.default {
            if let Some(backend) = self.backends.iter().find(|b| b.name() == default) {
                return Ok(Arc::clone(backend));
            }
        }

        Err(DimsError::bad_request(format!(
            "Unsupported image source: {}",
            url
        )))
    }

    /// Resolve and fetch `url`
    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<SourceImage, DimsError> {
        let backend = self.resolve(url)?;
        tracing::debug!(backend = backend.name(), url = %url, "Fetching source image");
        backend.fetch(url, timeout).await
    }
}
