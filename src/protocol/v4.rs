//! `/dims4/{clientId}/{signature}/{timestamp}/{commands...}?url=...`

use md5::{Digest, Md5};
use regex::Regex;

use super::{Protocol, SignedUrl, V4Params};
use crate::commands::parse_commands;
use crate::config::{Config, EtagAlgorithm};
use crate::error::DimsError;
use crate::request::{wants_disposition, QueryParams, Request};
use crate::signing::{constant_time_compare, sign_v4};
use crate::source::SourceImage;

/// Leading decimal digits of `raw`, or 0
fn parse_timestamp(raw: &str) -> i64 {
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map_or(0, |v| sign * v)
}

/// `md5(client_id + commands + image_url)`
pub fn request_id(client_id: &str, commands: &str, image_url: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(client_id.as_bytes());
    hasher.update(commands.as_bytes());
    hasher.update(image_url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Parse the path after the `/dims4/` prefix
pub fn parse(
    config: &Config,
    path: &str,
    rest: &str,
    query: QueryParams,
) -> Result<Request, DimsError> {
    let mut parts = rest.splitn(4, '/');
    let (Some(client_id), Some(signature), Some(timestamp), Some(commands)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(DimsError::bad_request("invalid dims4 path format"));
    };

    let image_url = query.value("url").to_string();
    let config = config.for_request(EtagAlgorithm::Md5);

    Ok(Request {
        id: request_id(client_id, commands, &image_url),
        path: path.to_string(),
        send_content_disposition: wants_disposition(&config, &query),
        query,
        image_url,
        raw_commands: commands.to_string(),
        signature: signature.to_string(),
        signed_params: Vec::new(),
        protocol: Protocol::V4(V4Params {
            client_id: client_id.to_string(),
            timestamp: parse_timestamp(timestamp),
            trailing_slash: path.ends_with('/'),
        }),
        source_image: SourceImage::default(),
        shrink_factor: 1,
        config,
    })
}

pub fn verify(request: &Request, params: &V4Params) -> bool {
    let key = request.config.signing_key();
    let sign = |trailing_slash| {
        sign_v4(
            params.timestamp,
            key,
            &request.raw_commands,
            trailing_slash,
            &request.image_url,
        )
    };

    if constant_time_compare(&sign(params.trailing_slash), &request.signature) {
        return true;
    }

    // mod-dims clients sign with the trailing slash even when the path has none
    let accepted = !params.trailing_slash && constant_time_compare(&sign(true), &request.signature);
    if !accepted {
        tracing::debug!(request_id = %request.id, "v4 signature mismatch");
    }
    accepted
}

/// Replace the signature segment of a v4 URL
pub fn sign_url(
    origin: &str,
    path: &str,
    rest: &str,
    query: &QueryParams,
    signing_key: &str,
) -> Result<SignedUrl, DimsError> {
    let pattern = Regex::new(r"^([^/]+)/(\w{7})/([^/]+)/(.+)$")
        .map_err(|e| DimsError::internal(e.to_string()))?;
    let captures = pattern
        .captures(rest)
        .ok_or_else(|| DimsError::bad_request("failed to match path"))?;

    let client_id = &captures[1];
    let timestamp = &captures[3];
    let commands = &captures[4];
    let image_url = query.value("url").to_string();

    let signature = sign_v4(
        parse_timestamp(timestamp),
        signing_key,
        commands,
        path.ends_with('/'),
        &image_url,
    );

    let prefix = &path[..path.len() - rest.len()];
    let mut url = format!(
        "{}{}{}/{}/{}/{}",
        origin, prefix, client_id, signature, timestamp, commands
    );
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query.encode());
    }

    Ok(SignedUrl {
        url,
        image_url,
        commands: parse_commands(commands),
    })
}
