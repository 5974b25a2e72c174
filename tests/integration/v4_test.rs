// v4 protocol: /dims4/{client}/{sig}/{timestamp}/{commands}?url=

use md5::{Digest, Md5};

use super::test_harness::*;
use dims::signing::sign_v4;

const IMAGE_URL: &str = "http://img/x.png";

fn app() -> dims::app::App {
    let mut source = source(png(512, 512, [200, 10, 10]));
    source.etag = Some("\"abc123\"".to_string());
    source.last_modified = Some("Mon, 01 Jan 2024 00:00:00 GMT".to_string());

    let mut config = config();
    config.signing.signing_key = Some("k".to_string());
    app_with(config, StaticBackend::new().with(IMAGE_URL, source))
}

#[tokio::test]
async fn test_v4_happy_path() {
    // Client signs the command path with a trailing slash
    let sig = sign_v4(1_700_000_000, "k", "resize/100x100", true, IMAGE_URL);
    let path = format!("/dims4/c1/{}/1700000000/resize/100x100", sig);

    let response = get(&app(), &path, "url=http://img/x.png").await;

    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Type"), Some("image/png"));
    assert_eq!(
        response.header("Content-Length"),
        Some(response.body.len().to_string().as_str())
    );
    assert_eq!(
        response.header("Cache-Control"),
        Some("max-age=31536000, public")
    );
    assert!(response.header("Expires").is_some());
    assert_eq!(
        response.header("Last-Modified"),
        Some("Mon, 01 Jan 2024 00:00:00 GMT")
    );

    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (100, 100));

    let mut hasher = Md5::new();
    hasher.update(b"c1resize/100x100http://img/x.png");
    let id = hex::encode(hasher.finalize());
    let expected = hex::encode(Md5::digest(format!("{}\"abc123\"", id).as_bytes()));
    assert_eq!(response.header("ETag"), Some(expected.as_str()));
}

#[tokio::test]
async fn test_v4_alternate_prefix() {
    let sig = sign_v4(1_700_000_000, "k", "resize/50x50", false, IMAGE_URL);
    let path = format!("/v4/dims/c1/{}/1700000000/resize/50x50", sig);

    let response = get(&app(), &path, "url=http%3A%2F%2Fimg%2Fx.png").await;
    assert_eq!(response.status, 200);
    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (50, 50));
}

#[tokio::test]
async fn test_v4_bad_signature_is_401_error_image() {
    let path = "/dims4/c1/0000000/1700000000/resize/100x100";
    let response = get(&app(), path, "url=http://img/x.png").await;

    assert_eq!(response.status, 401);
    assert_eq!(response.header("Cache-Control"), Some("max-age=60, public"));
    assert!(response.header("ETag").is_none());

    // replayed against the error image
    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (100, 100));
}

#[tokio::test]
async fn test_v4_ignores_eurl() {
    let sig = sign_v4(1_700_000_000, "k", "resize/10x10", false, "");
    let path = format!("/dims4/c1/{}/1700000000/resize/10x10", sig);

    // with no `url`, the signature covers an empty image URL and the fetch fails
    let response = get(&app(), &path, "eurl=abcdef").await;
    assert_ne!(response.status, 200);
    assert_ne!(response.status, 401);
}

#[tokio::test]
async fn test_v4_development_mode_bypasses_signature() {
    let mut source = source(png(64, 64, [0, 0, 0]));
    source.etag = None;
    let mut config = config();
    config.development_mode = true;
    let app = app_with(config, StaticBackend::new().with(IMAGE_URL, source));

    let response = get(&app, "/dims4/c1/0000000/0/resize/32x32", "url=http://img/x.png").await;
    assert_eq!(response.status, 200);
    assert!(response.header("ETag").is_none());
}
