//! Response and timing configuration types.
//!
//! This module defines the request-level knobs that shape responses:
//! - Source download timeout
//! - Edge-Control downstream TTL
//! - Origin-trusting Cache-Control with clamps
//! - Error image background
//! - Output format defaults and exclusions
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CACHE_CONTROL_DEFAULT, DEFAULT_CACHE_CONTROL_ERROR, DEFAULT_DOWNLOAD_TIMEOUT_MS,
    DEFAULT_ERROR_BACKGROUND,
};

fn default_download_timeout() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_MS
}

fn default_cache_control_default() -> u64 {
    DEFAULT_CACHE_CONTROL_DEFAULT
}

fn default_cache_control_error() -> u64 {
    DEFAULT_CACHE_CONTROL_ERROR
}

fn default_background() -> String {
    DEFAULT_ERROR_BACKGROUND.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Source and overlay download timeout in milliseconds
    #[serde(default = "default_download_timeout")]
    pub download: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            download: default_download_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeControlConfig {
    /// Seconds; 0 disables the Edge-Control header
    #[serde(default)]
    pub downstream_ttl: u64,
}

/// Cache-Control derivation settings (all values in seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginCacheControlConfig {
    /// Trust the source's `max-age` when present
    #[serde(default)]
    pub use_origin: bool,
    /// Lower clamp for origin values (0 = no clamp)
    #[serde(default)]
    pub min: u64,
    /// Upper clamp for origin values (0 = no clamp)
    #[serde(default)]
    pub max: u64,
    #[serde(default = "default_cache_control_default")]
    pub default: u64,
    /// max-age used for error images
    #[serde(default = "default_cache_control_error")]
    pub error: u64,
}

impl Default for OriginCacheControlConfig {
    fn default() -> Self {
        Self {
            use_origin: false,
            min: 0,
            max: 0,
            default: default_cache_control_default(),
            error: default_cache_control_error(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorImageConfig {
    /// `#RRGGBB` fill colour
    #[serde(default = "default_background")]
    pub background: String,
}

impl Default for ErrorImageConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormatConfig {
    /// Format applied when no `format` command is present
    #[serde(default)]
    pub default: Option<String>,
    /// Source formats the default is never applied to
    #[serde(default)]
    pub excluded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsConfig {
    #[serde(default = "default_true")]
    pub strip_metadata: bool,
    #[serde(default)]
    pub include_disposition: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            strip_metadata: true,
            include_disposition: false,
        }
    }
}
