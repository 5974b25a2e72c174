//! Request protocols.
//!
//! Two URL grammars are served side by side:
//!
//! | Version | Path | Signature | Request id | ETag hash |
//! |---------|------|-----------|------------|-----------|
//! | v4 | `/dims4/{client}/{sig}/{ts}/{commands}` | MD5, 7 hex chars | MD5 | MD5 |
//! | v5 | `/v5/{commands}?sig=` | HMAC-SHA-256, 31 bytes | SHA-256 | SHA-256 |
//!
//! Each adapter parses the path and query into a [`Request`]; signature
//! checking is deferred to [`verify`] so a rejected request can still render
//! the error image.

use crate::commands::Command;
use crate::config::Config;
use crate::error::DimsError;
use crate::request::{QueryParams, Request};

pub mod v4;
pub mod v5;

/// Protocol-specific request state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Protocol {
    V4(V4Params),
    V5,
}

/// Path components only v4 carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V4Params {
    pub client_id: String,
    pub timestamp: i64,
    /// Whether the request path ended with `/`
    pub trailing_slash: bool,
}

/// Protocol version selected from a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V4,
    V5,
}

pub const V4_PREFIXES: [&str; 2] = ["/dims4/", "/v4/dims/"];
pub const V5_PREFIXES: [&str; 2] = ["/v5/dims/", "/v5/"];

/// Pick the protocol for `path` and return the remainder after its prefix
pub fn route(path: &str) -> Option<(Version, &str)> {
    for prefix in V4_PREFIXES {
        if let Some(rest) = path.strip_prefix(prefix) {
            return Some((Version::V4, rest));
        }
    }
    for prefix in V5_PREFIXES {
        if let Some(rest) = path.strip_prefix(prefix) {
            return Some((Version::V5, rest));
        }
    }
    None
}

/// Build a request for `path`, or `None` when no protocol serves it
pub fn parse_request(
    config: &Config,
    key: &[u8; 16],
    path: &str,
    query: QueryParams,
) -> Option<Result<Request, DimsError>> {
    let (version, rest) = route(path)?;
    let request = match version {
        Version::V4 => v4::parse(config, path, rest, query),
        Version::V5 => v5::parse(config, key, path, rest, query),
    };
    Some(request)
}

/// Check the claimed signature of `request`
pub fn verify(request: &Request) -> bool {
    match &request.protocol {
        Protocol::V4(params) => v4::verify(request, params),
        Protocol::V5 => v5::verify(request),
    }
}

/// A request URL with a fresh signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    pub image_url: String,
    pub commands: Vec<Command>,
}

/// Split an absolute or path-only URL into `(origin, path, query)`
pub(crate) fn split_url(url: &str) -> (&str, &str, &str) {
    let (without_query, query) = url.split_once('?').unwrap_or((url, ""));
    let path_start = match without_query.find("://") {
        Some(scheme_end) => without_query[scheme_end + 3..]
            .find('/')
            .map_or(without_query.len(), |i| scheme_end + 3 + i),
        None => 0,
    };
    (
        &without_query[..path_start],
        &without_query[path_start..],
        query,
    )
}

/// Re-sign a v4 or v5 request URL with `signing_key`
///
/// With `encrypt`, a v5 URL has its `url` parameter replaced by `eurl`.
pub fn sign_url(
    request_url: &str,
    signing_key: &str,
    encrypt: bool,
) -> Result<SignedUrl, DimsError> {
    let (origin, path, raw_query) = split_url(request_url);
    let query = QueryParams::parse(raw_query);

    match route(path) {
        Some((Version::V4, rest)) => v4::sign_url(origin, path, rest, &query, signing_key),
        Some((Version::V5, rest)) => v5::sign_url(origin, path, rest, query, signing_key, encrypt),
        None => Err(DimsError::bad_request(format!(
            "path must start with /dims4/ or /v5/: {}",
            path
        ))),
    }
}
