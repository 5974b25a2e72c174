//! v5 signatures.
//!
//! ```text
//! signature = hmac_sha256(key, commands + image_url + extra_values...)[0..31]
//! ```
//!
//! Extra values are the query parameters named by `_keys`, in declared
//! order. Clients submit the signature hex-encoded (62 characters).

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{constant_time_eq, sanitize_commands, SigningError};
use crate::constants::V5_SIGNATURE_BYTES;

type HmacSha256 = Hmac<Sha256>;

/// Compute the raw 31-byte v5 signature
pub fn sign_v5<S: AsRef<str>>(
    key: &str,
    commands: &str,
    image_url: &str,
    extra_values: &[S],
) -> Vec<u8> {
    // keys of any length are accepted, longer ones are hashed first
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(sanitize_commands(commands).as_bytes());
    mac.update(image_url.as_bytes());
    for value in extra_values {
        mac.update(value.as_ref().as_bytes());
    }

    let mut tag = mac.finalize().into_bytes().to_vec();
    tag.truncate(V5_SIGNATURE_BYTES);
    tag
}

/// Hex-encoded v5 signature, as placed in the `sig` query parameter
pub fn sign_v5_hex<S: AsRef<str>>(
    key: &str,
    commands: &str,
    image_url: &str,
    extra_values: &[S],
) -> String {
    hex::encode(sign_v5(key, commands, image_url, extra_values))
}

/// Verify a hex-encoded v5 signature in constant time
///
/// Returns `Ok(false)` on mismatch and an error only when `signature` is not
/// valid hex.
pub fn verify_v5<S: AsRef<str>>(
    signature: &str,
    key: &str,
    commands: &str,
    image_url: &str,
    extra_values: &[S],
) -> Result<bool, SigningError> {
    let claimed = hex::decode(signature)
        .map_err(|e| SigningError::InvalidSignatureEncoding(e.to_string()))?;
    let expected = sign_v5(key, commands, image_url, extra_values);
    Ok(constant_time_eq(&claimed, &expected))
}
