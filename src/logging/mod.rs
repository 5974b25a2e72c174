// Logging module for structured logging using the tracing crate

use std::error::Error;
use tracing_subscriber::EnvFilter;

/// Resolve the log filter for the process
///
/// `RUST_LOG` wins when set; otherwise `debug` in debug mode and `info`
/// in every other mode.
pub fn build_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    })
}

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - JSON formatting for easy parsing by log aggregation systems
/// - Filtering based on `RUST_LOG` or the `debug_mode` flag
/// - Output to stdout for container/cloud-native deployments
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
///
/// # Examples
///
/// ```
/// use dims::logging::init_subscriber;
///
/// init_subscriber(false).ok();
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(debug: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(build_filter(debug))
        .with_writer(std::io::stdout)
        .with_current_span(false)
        .try_init()
}
