//! AES key derivation from the configured signing key.

use hkdf::Hkdf;
use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::constants::{DERIVED_KEY_LEN, HKDF_SALT};

/// Derive the 16-byte AES-128 key
///
/// - `sha1:<key>`: first 16 hex characters of SHA-1(key), uppercased, as ASCII
/// - `hkdf:<key>` or anything else: HKDF-SHA256 with salt `go-dims`, empty info
pub fn derive_key(signing_key: &str) -> [u8; DERIVED_KEY_LEN] {
    let mut okm = [0u8; DERIVED_KEY_LEN];

    if let Some(legacy) = signing_key.strip_prefix("sha1:") {
        let digest = hex::encode(Sha1::digest(legacy.as_bytes())).to_uppercase();
        okm.copy_from_slice(&digest.as_bytes()[..DERIVED_KEY_LEN]);
        return okm;
    }

    let ikm = signing_key.strip_prefix("hkdf:").unwrap_or(signing_key);
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), ikm.as_bytes());
    // output length is constant and far below the 255 * 32 byte limit
    hk.expand(&[], &mut okm)
        .expect("16 bytes is a valid HKDF-SHA256 output length");
    okm
}
