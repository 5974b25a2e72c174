//! `/v5/{commands...}?url=...&sig=...[&eurl=...][&_keys=k1,k2]`

use sha2::{Digest, Sha256};

use super::{Protocol, SignedUrl};
use crate::commands::parse_commands;
use crate::config::{Config, EtagAlgorithm};
use crate::error::DimsError;
use crate::request::{wants_disposition, QueryParams, Request};
use crate::signing::{decrypt_url, derive_key, encrypt_url, sign_v5_hex, verify_v5};
use crate::source::SourceImage;

/// Query keys that never contribute to the signature
pub const UNSIGNED_PARAMS: [&str; 5] = ["_keys", "eurl", "sig", "url", "download"];

/// Values of the parameters named by `_keys`, in declared order
///
/// Missing and empty values are skipped.
pub fn signed_param_values(query: &QueryParams) -> Vec<String> {
    query
        .value("_keys")
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty() && !UNSIGNED_PARAMS.contains(key))
        .filter_map(|key| query.get(key))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// `sha256(commands + image_url)`
pub fn request_id(commands: &str, image_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(commands.as_bytes());
    hasher.update(image_url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Source URL from `eurl` when present, otherwise `url`
fn resolve_image_url(key: &[u8; 16], query: &QueryParams) -> Result<String, DimsError> {
    match query.get("eurl") {
        Some(eurl) if !eurl.is_empty() => Ok(decrypt_url(key, eurl)?),
        _ => Ok(query.value("url").to_string()),
    }
}

/// Parse the path after the `/v5/` prefix
pub fn parse(
    config: &Config,
    key: &[u8; 16],
    path: &str,
    rest: &str,
    query: QueryParams,
) -> Result<Request, DimsError> {
    let image_url = resolve_image_url(key, &query)?;
    let config = config.for_request(EtagAlgorithm::HmacSha256);

    Ok(Request {
        id: request_id(rest, &image_url),
        path: path.to_string(),
        send_content_disposition: wants_disposition(&config, &query),
        signature: query.value("sig").to_string(),
        signed_params: signed_param_values(&query),
        query,
        image_url,
        raw_commands: rest.to_string(),
        protocol: Protocol::V5,
        source_image: SourceImage::default(),
        shrink_factor: 1,
        config,
    })
}

pub fn verify(request: &Request) -> bool {
    match verify_v5(
        &request.signature,
        request.config.signing_key(),
        &request.raw_commands,
        &request.image_url,
        &request.signed_params,
    ) {
        Ok(valid) => valid,
        Err(err) => {
            tracing::debug!(request_id = %request.id, error = %err, "Malformed v5 signature");
            false
        }
    }
}

/// Sign a v5 URL, optionally swapping `url` for `eurl`
pub fn sign_url(
    origin: &str,
    path: &str,
    rest: &str,
    mut query: QueryParams,
    signing_key: &str,
    encrypt: bool,
) -> Result<SignedUrl, DimsError> {
    let key = derive_key(signing_key);
    let image_url = resolve_image_url(&key, &query)?;
    let signature = sign_v5_hex(signing_key, rest, &image_url, &signed_param_values(&query));

    query.remove("sig");
    if encrypt {
        query.remove("url");
        query.remove("eurl");
        query.insert("eurl", encrypt_url(&key, &image_url)?);
    }
    query.insert("sig", signature);

    Ok(SignedUrl {
        url: format!("{}{}?{}", origin, path, query.encode()),
        image_url,
        commands: parse_commands(rest),
    })
}
