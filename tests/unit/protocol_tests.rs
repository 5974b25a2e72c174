// Routing, re-signing and verification across both protocols

use dims::config::Config;
use dims::protocol::{self, Protocol, Version};
use dims::request::QueryParams;
use dims::signing::derive_key;

fn config(key: &str) -> Config {
    let mut config = Config::default();
    config.signing.signing_key = Some(key.to_string());
    config
}

fn parse(config: &Config, url: &str) -> dims::request::Request {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let path = path
        .find("://")
        .and_then(|i| path[i + 3..].find('/').map(|j| &path[i + 3 + j..]))
        .unwrap_or(path);
    protocol::parse_request(
        config,
        &derive_key(config.signing_key()),
        path,
        QueryParams::parse(query),
    )
    .expect("routable path")
    .expect("parsable request")
}

#[test]
fn test_route_selects_protocol() {
    assert_eq!(protocol::route("/dims4/a/b/c/d").map(|r| r.0), Some(Version::V4));
    assert_eq!(protocol::route("/v5/resize/1x1").map(|r| r.0), Some(Version::V5));
    assert!(protocol::route("/v6/resize/1x1").is_none());
    assert!(protocol::route("/dims4").is_none());
}

#[test]
fn test_resigned_v5_url_verifies() {
    let signed = protocol::sign_url(
        "https://img.example.com/v5/resize/100x100?url=http%3A%2F%2Fimg%2Fx.png&sig=stale&_keys=t&t=acme",
        "secret",
        false,
    )
    .unwrap();
    assert_eq!(signed.image_url, "http://img/x.png");
    assert_eq!(signed.commands.len(), 1);

    let request = parse(&config("secret"), &signed.url);
    assert_eq!(request.protocol, Protocol::V5);
    assert!(protocol::verify(&request));
    assert!(!protocol::verify(&parse(&config("other"), &signed.url)));
}

#[test]
fn test_resigned_v5_url_with_encryption() {
    let signed = protocol::sign_url(
        "https://img.example.com/v5/resize/10x10?url=http%3A%2F%2Fimg%2Fsecret.png",
        "secret",
        true,
    )
    .unwrap();
    assert!(!signed.url.contains("url=http"));
    assert!(signed.url.contains("eurl="));

    let request = parse(&config("secret"), &signed.url);
    assert_eq!(request.image_url, "http://img/secret.png");
    assert!(protocol::verify(&request));
}

#[test]
fn test_resigned_v4_url_verifies() {
    let signed = protocol::sign_url(
        "https://img.example.com/dims4/client/0000000/1700000000/resize/100x100?url=http%3A%2F%2Fimg%2Fx.png",
        "k",
        false,
    )
    .unwrap();
    assert!(signed
        .url
        .starts_with("https://img.example.com/dims4/client/"));
    assert!(!signed.url.contains("/0000000/"));

    let request = parse(&config("k"), &signed.url);
    assert!(matches!(request.protocol, Protocol::V4(_)));
    assert!(protocol::verify(&request));
}

#[test]
fn test_v4_and_v5_ids_differ_in_shape() {
    let v4 = parse(&config("k"), "/dims4/c/abcdefg/1/resize/1x1?url=u");
    let v5 = parse(&config("k"), "/v5/resize/1x1?url=u&sig=00");
    assert_eq!(v4.id.len(), 32);
    assert_eq!(v5.id.len(), 64);
}
