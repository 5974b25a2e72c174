//! Legacy v4 signatures.
//!
//! ```text
//! signature = hex(md5(timestamp + key + commands + image_url))[0..7]
//! ```
//!
//! `commands` has spaces replaced by `+` and surrounding slashes trimmed.
//! Clients historically signed the path with its trailing slash, so one is
//! appended back when the request path ended with `/`.

use md5::{Digest, Md5};

use super::sanitize_commands;
use crate::constants::V4_SIGNATURE_LEN;

/// Compute the 7-character v4 signature
pub fn sign_v4(
    timestamp: i64,
    key: &str,
    commands: &str,
    trailing_slash: bool,
    image_url: &str,
) -> String {
    let mut commands = sanitize_commands(commands).trim_matches('/').to_string();
    if trailing_slash {
        commands.push('/');
    }

    let mut hasher = Md5::new();
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(key.as_bytes());
    hasher.update(commands.as_bytes());
    hasher.update(image_url.as_bytes());

    let mut signature = hex::encode(hasher.finalize());
    signature.truncate(V4_SIGNATURE_LEN);
    signature
}
