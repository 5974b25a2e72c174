//! Overlay download and caching.
//!
//! Decoded overlays are kept in a moka cache keyed by URL so repeated
//! requests for the same watermark skip the fetch and decode.

use image::DynamicImage;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::codec;
use crate::constants::{OVERLAY_CACHE_MAX_ENTRIES, OVERLAY_CACHE_TTL_SECS};
use crate::error::DimsError;
use crate::source::BackendRegistry;

/// Cache of decoded overlay images
#[derive(Clone)]
pub struct OverlayCache {
    cache: Cache<String, Arc<DynamicImage>>,
}

impl std::fmt::Debug for OverlayCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl Default for OverlayCache {
    fn default() -> Self {
        Self::new(
            OVERLAY_CACHE_MAX_ENTRIES,
            Duration::from_secs(OVERLAY_CACHE_TTL_SECS),
        )
    }
}

impl OverlayCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// Fetch and decode `url`, or return the cached overlay
    pub async fn fetch(
        &self,
        url: &str,
        registry: &BackendRegistry,
        timeout: Duration,
    ) -> Result<Arc<DynamicImage>, DimsError> {
        if let Some(cached) = self.cache.get(url).await {
            return Ok(cached);
        }

        let source = registry.fetch(url, timeout).await?;
        if source.status != 200 {
            return Err(DimsError::status(
                source.status,
                format!("failed to fetch overlay from {}", url),
            ));
        }
        let overlay = codec::decode(&source.bytes, 1)?.into_image();
        let overlay = Arc::new(overlay);

        self.cache.insert(url.to_string(), Arc::clone(&overlay)).await;
        Ok(overlay)
    }

    /// Get the number of cached overlays.
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if an overlay is cached.
    pub async fn contains(&self, url: &str) -> bool {
        self.cache.get(url).await.is_some()
    }
}
