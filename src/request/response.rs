//! Response shaping.
//!
//! [`DimsResponse`] is the transport-neutral result of a request; the
//! pingora server and the Lambda adapters each write it out their own way.

use bytes::Bytes;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use md5::Md5;
use regex::Regex;
use sha2::{Digest, Sha256};

use super::Request;
use crate::codec::EncodedImage;
use crate::config::{Config, EtagAlgorithm};
use crate::constants::HTTP_DATE_FORMAT;
use crate::source::SourceImage;

/// Status, headers and body ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimsResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl DimsResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Plain-text response with Content-Type and Content-Length set
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let mut response = Self::new(status, body);
        response.set_header("Content-Type", "text/plain; charset=utf-8");
        response.set_header("Content-Length", response.body.len().to_string());
        response
    }

    /// Image response carrying `image/<fmt>` and the body length
    pub fn image(status: u16, encoded: EncodedImage) -> Self {
        let content_type = encoded.content_type;
        let mut response = Self::new(status, encoded.data);
        response.set_header("Content-Type", content_type);
        response.set_header("Content-Length", response.body.len().to_string());
        response
    }

    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every value of `name` with `value`
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }
}

/// `max-age` seconds from a source Cache-Control header
pub fn source_max_age(header: &str) -> Option<u64> {
    let pattern = Regex::new(r"max-age=(\d+)").ok()?;
    pattern.captures(header)?.get(1)?.as_str().parse().ok()
}

/// max-age for a successful response
///
/// The origin's value is used only when trusted, clamped to the non-zero
/// bounds.
pub fn max_age(config: &Config, source: &SourceImage) -> u64 {
    let cache = &config.origin_cache_control;
    if !cache.use_origin {
        return cache.default;
    }

    let Some(mut age) = source.cache_control.as_deref().and_then(source_max_age) else {
        return cache.default;
    };
    if cache.min != 0 && age <= cache.min {
        age = cache.min;
    }
    if cache.max != 0 && age >= cache.max {
        age = cache.max;
    }
    age
}

/// Set `Cache-Control` and `Expires` unless `max_age` is 0
pub fn set_cache_headers(response: &mut DimsResponse, max_age: u64, now: DateTime<Utc>) {
    if max_age == 0 {
        return;
    }
    let expires = now + ChronoDuration::seconds(max_age as i64);
    response.set_header("Cache-Control", format!("max-age={}, public", max_age));
    response.set_header("Expires", expires.format(HTTP_DATE_FORMAT).to_string());
}

/// Last path segment of the source URL
pub fn disposition_filename(image_url: &str) -> String {
    let without_query = image_url
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    let path = match without_query.find("://") {
        Some(scheme_end) => {
            let rest = &without_query[scheme_end + 3..];
            rest.find('/').map_or("", |i| &rest[i..])
        }
        None => without_query,
    };

    match path.trim_end_matches('/').rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ if path.starts_with('/') => "/".to_string(),
        _ => ".".to_string(),
    }
}

fn digest_hex<D: Digest>(parts: &[&str]) -> String {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// `H(id + validator)` where the validator is the source ETag, falling back
/// to its Last-Modified
pub fn etag(request: &Request) -> Option<String> {
    let source = &request.source_image;
    let validator = source
        .etag
        .as_deref()
        .filter(|v| !v.is_empty())
        .or_else(|| source.last_modified.as_deref().filter(|v| !v.is_empty()))?;

    let parts = [request.id.as_str(), validator];
    Some(match request.config.etag_algorithm {
        EtagAlgorithm::Md5 => digest_hex::<Md5>(&parts),
        EtagAlgorithm::HmacSha256 => digest_hex::<Sha256>(&parts),
    })
}

/// Headers shared by image and error-image responses
fn set_common_headers(response: &mut DimsResponse, request: &Request, max_age: u64) {
    set_cache_headers(response, max_age, Utc::now());

    let ttl = request.config.edge_control.downstream_ttl;
    if ttl > 0 {
        response.set_header("Edge-Control", format!("downstream-ttl={}", ttl));
    }

    if request.send_content_disposition {
        response.set_header(
            "Content-Disposition",
            format!(
                "attachment; filename={}",
                disposition_filename(&request.image_url)
            ),
        );
    }
}

/// Response for a successfully transformed image
pub fn image_response(request: &Request, encoded: EncodedImage) -> DimsResponse {
    let mut response = DimsResponse::image(200, encoded);
    set_common_headers(
        &mut response,
        request,
        max_age(&request.config, &request.source_image),
    );

    if let Some(etag) = etag(request) {
        response.set_header("ETag", etag);
    }
    if let Some(last_modified) = request
        .source_image
        .last_modified
        .as_deref()
        .filter(|v| !v.is_empty())
    {
        response.set_header("Last-Modified", last_modified);
    }
    response
}

/// Response carrying the rendered error image
///
/// Source validators are not forwarded and the error max-age applies.
pub fn error_image_response(request: &Request, status: u16, encoded: EncodedImage) -> DimsResponse {
    let mut response = DimsResponse::image(status, encoded);
    set_common_headers(
        &mut response,
        request,
        request.config.origin_cache_control.error,
    );
    response
}
