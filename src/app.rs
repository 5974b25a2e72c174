//! Process-wide state shared by every request.

use crate::config::Config;
use crate::constants::DERIVED_KEY_LEN;
use crate::error::DimsError;
use crate::signing::derive_key;
use crate::source::BackendRegistry;
use crate::watermark::OverlayCache;

/// Startup-assembled state: config, backends, URL key and overlay cache
///
/// The registry is filled once here and only read afterwards.
#[derive(Debug)]
pub struct App {
    pub config: Config,
    pub registry: BackendRegistry,
    /// AES-128 key for `eurl`, derived from the signing key
    pub key: [u8; DERIVED_KEY_LEN],
    pub overlays: OverlayCache,
}

impl App {
    pub fn new(config: Config) -> Result<Self, DimsError> {
        let registry = BackendRegistry::from_config(&config)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Build with a caller-supplied registry
    pub fn with_registry(config: Config, registry: BackendRegistry) -> Self {
        tracing::info!(
            backends = ?registry.names(),
            default_backend = %config.source.default,
            development_mode = config.development_mode,
            "Initialized dims"
        );
        Self {
            key: derive_key(config.signing_key()),
            config,
            registry,
            overlays: OverlayCache::default(),
        }
    }
}
