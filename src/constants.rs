// Constants module - centralized default values for configuration
//
// This module defines all default values used throughout the codebase.
// Using constants instead of magic numbers keeps the env bindings, the YAML
// defaults and the tests in agreement.

// =============================================================================
// Server defaults
// =============================================================================

/// Default listener endpoint (Go-style `host:port`, empty host = all interfaces)
pub const DEFAULT_BIND_ADDRESS: &str = ":8080";

/// Default source download timeout in milliseconds
pub const DEFAULT_DOWNLOAD_TIMEOUT_MS: u64 = 3000;

/// Timeout used by the `health` subcommand
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 2;

// =============================================================================
// Cache-Control defaults (seconds)
// =============================================================================

/// Default max-age for successful responses (one year)
pub const DEFAULT_CACHE_CONTROL_DEFAULT: u64 = 31_536_000;

/// Default max-age for error images
pub const DEFAULT_CACHE_CONTROL_ERROR: u64 = 60;

/// `Last-Modified` / `Expires` date format
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

// =============================================================================
// Error image defaults
// =============================================================================

/// Background colour of the generated error image
pub const DEFAULT_ERROR_BACKGROUND: &str = "#5ADAFD";

/// Edge length of the generated error image
pub const ERROR_IMAGE_SIZE: u32 = 512;

/// Largest edge a resampling step may produce
pub const MAX_IMAGE_DIMENSION: u32 = 16_384;

/// Largest pixel count a resampling step may produce
pub const MAX_IMAGE_PIXELS: u64 = 100_000_000;

// =============================================================================
// Codec defaults
// =============================================================================

pub const DEFAULT_JPEG_QUALITY: u8 = 80;
pub const DEFAULT_JPEG_QUANT_TABLE: u8 = 3;
pub const DEFAULT_PNG_QUALITY: u8 = 80;
pub const DEFAULT_PNG_COMPRESSION: u8 = 4;
pub const DEFAULT_WEBP_QUALITY: u8 = 80;
pub const DEFAULT_WEBP_REDUCTION_EFFORT: u8 = 4;

// =============================================================================
// Source defaults
// =============================================================================

/// Backend used when no registered backend claims a URL
pub const DEFAULT_SOURCE_BACKEND: &str = "http";

/// Default base directory for the file backend
pub const DEFAULT_FILE_BASE_DIR: &str = "./resources";

/// Names of every backend this build knows how to construct
pub const KNOWN_SOURCE_BACKENDS: [&str; 3] = ["file", "http", "s3"];

// =============================================================================
// Signing defaults
// =============================================================================

/// Salt used for HKDF key derivation
pub const HKDF_SALT: &[u8] = b"go-dims";

/// Length in bytes of the derived AES-128 key
pub const DERIVED_KEY_LEN: usize = 16;

/// Number of MD5 hex characters in a v4 signature
pub const V4_SIGNATURE_LEN: usize = 7;

/// Number of HMAC-SHA-256 bytes kept in a v5 signature
pub const V5_SIGNATURE_BYTES: usize = 31;

// =============================================================================
// Watermark overlay cache
// =============================================================================

/// Maximum number of decoded overlays kept in memory
pub const OVERLAY_CACHE_MAX_ENTRIES: u64 = 100;

/// Time-to-live of a cached overlay in seconds
pub const OVERLAY_CACHE_TTL_SECS: u64 = 300;

/// Product token sent as the HTTP backend User-Agent
pub fn user_agent() -> String {
    format!("go-dims/{}", env!("CARGO_PKG_VERSION"))
}
