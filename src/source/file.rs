//! Local file backend

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{SourceBackend, SourceImage};
use crate::error::DimsError;

/// Serves files under a base directory
#[derive(Debug, Clone)]
pub struct FileBackend {
    base_dir: PathBuf,
}

impl FileBackend {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Map a source URL to a path under the base directory
    ///
    /// `..` segments are resolved lexically and can never climb above the
    /// base directory.
    pub fn resolve_path(&self, url: &str) -> PathBuf {
        let path = url.strip_prefix("file://").unwrap_or(url);

        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }

        segments
            .iter()
            .fold(self.base_dir.clone(), |acc, segment| acc.join(segment))
    }
}

#[async_trait]
impl SourceBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn can_handle(&self, url: &str) -> bool {
        url.starts_with("file://") || url.starts_with('/') || url.starts_with("./")
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<SourceImage, DimsError> {
        let path = self.resolve_path(url);
        tracing::debug!(path = %path.display(), "Reading source file");

        let data = match tokio::time::timeout(timeout, tokio::fs::read(&path)).await {
            Ok(Ok(data)) => data,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DimsError::status(
                    404,
                    format!("file not found: {}", path.display()),
                ));
            }
            Ok(Err(e)) => {
                return Err(DimsError::internal(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
            Err(_) => return Err(DimsError::timeout("Timeout reading file")),
        };

        Ok(SourceImage::from_bytes(data))
    }
}
