//! Request signing and source URL encryption
//!
//! Provides:
//! - v4 signatures: truncated MD5 over timestamp, key, commands and URL
//! - v5 signatures: truncated HMAC-SHA256 with signed extra parameters
//! - Key derivation for the AES-128 URL cipher
//! - AES-128-GCM encryption of source URLs (`eurl`)

pub mod encryption;
pub mod keys;
pub mod v4;
pub mod v5;

pub use encryption::{decrypt_url, encrypt_url};
pub use keys::derive_key;
pub use v4::sign_v4;
pub use v5::{sign_v5, sign_v5_hex, verify_v5};

/// Errors raised by signing and URL encryption
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(String),
    #[error("encrypted payload too short: {0} bytes")]
    PayloadTooShort(usize),
    #[error("failed to decrypt payload")]
    DecryptFailed,
    #[error("failed to encrypt payload")]
    EncryptFailed,
    #[error("decrypted payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Normalise a command string for signing: spaces become `+`
pub fn sanitize_commands(commands: &str) -> String {
    commands.replace(' ', "+")
}

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// Constant-time byte comparison
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
