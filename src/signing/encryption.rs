//! AES-128-GCM encryption of source URLs.
//!
//! Wire format: `base64(iv[12] || ciphertext || tag[16])`, standard alphabet.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;

use super::SigningError;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Encrypt `url` with a fresh random nonce
pub fn encrypt_url(key: &[u8; 16], url: &str) -> Result<String, SigningError> {
    let cipher = Aes128Gcm::new_from_slice(key).map_err(|_| SigningError::EncryptFailed)?;

    let mut iv = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let sealed = cipher
        .encrypt(Nonce::from_slice(&iv), url.as_bytes())
        .map_err(|_| SigningError::EncryptFailed)?;

    let mut payload = Vec::with_capacity(NONCE_LEN + sealed.len());
    payload.extend_from_slice(&iv);
    payload.extend_from_slice(&sealed);
    Ok(STANDARD.encode(payload))
}

/// Decrypt an `eurl` payload
///
/// Spaces are read as `+`, since query decoding turns an unescaped `+` into
/// a space.
pub fn decrypt_url(key: &[u8; 16], payload: &str) -> Result<String, SigningError> {
    let payload = payload.replace(' ', "+");
    let data = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| SigningError::InvalidPayload(e.to_string()))?;

    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(SigningError::PayloadTooShort(data.len()));
    }

    let cipher = Aes128Gcm::new_from_slice(key).map_err(|_| SigningError::DecryptFailed)?;
    let (iv, sealed) = data.split_at(NONCE_LEN);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(iv), sealed)
        .map_err(|_| SigningError::DecryptFailed)?;

    String::from_utf8(plaintext).map_err(|_| SigningError::InvalidUtf8)
}
