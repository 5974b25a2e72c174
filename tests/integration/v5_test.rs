// v5 protocol: /v5/{commands}?url=&sig=[&eurl=][&_keys=]

use sha2::{Digest, Sha256};

use super::test_harness::*;
use dims::signing::{derive_key, encrypt_url, sign_v5_hex};

const IMAGE_URL: &str = "http://img/x.png";
const NO_EXTRAS: &[&str] = &[];

fn app_serving(bytes: Vec<u8>) -> dims::app::App {
    app_with(config(), StaticBackend::new().with(IMAGE_URL, source(bytes)))
}

#[tokio::test]
async fn test_v5_signed_params() {
    let sig = sign_v5_hex(SIGNING_KEY, "resize/100x100", IMAGE_URL, &["acme", "pro"]);
    let query = format!(
        "url=http://img/x.png&sig={}&_keys=tenant,role&tenant=acme&role=pro",
        sig
    );

    let app = app_serving(png(512, 512, [0, 128, 0]));
    let response = get(&app, "/v5/resize/100x100", &query).await;
    assert_eq!(response.status, 200);
    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (100, 100));

    // dropping a signed parameter invalidates the signature
    let response = get(&app, "/v5/resize/100x100", &query.replace("&role=pro", "")).await;
    assert_eq!(response.status, 401);
}

#[tokio::test]
async fn test_v5_encrypted_url() {
    let eurl = encrypt_url(&derive_key(SIGNING_KEY), IMAGE_URL).unwrap();
    let sig = sign_v5_hex(SIGNING_KEY, "resize/50x50", IMAGE_URL, NO_EXTRAS);
    let query = format!("eurl={}&sig={}", urlencoding::encode(&eurl), sig);

    let app = app_serving(png(200, 100, [0, 0, 255]));
    let response = get(&app, "/v5/resize/50x50", &query).await;
    assert_eq!(response.status, 200);
    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (50, 25));
}

#[tokio::test]
async fn test_v5_corrupt_eurl_is_plain_400() {
    let app = app_serving(png(10, 10, [0, 0, 0]));
    let response = get(&app, "/v5/resize/50x50", "eurl=AAAA&sig=00").await;
    assert_eq!(response.status, 400);
    assert!(response
        .header("Content-Type")
        .unwrap()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_v5_etag_uses_sha256() {
    let mut source = source(png(32, 32, [1, 2, 3]));
    source.etag = Some("v1".to_string());
    let app = app_with(config(), StaticBackend::new().with(IMAGE_URL, source));

    let sig = sign_v5_hex(SIGNING_KEY, "resize/16x16", IMAGE_URL, NO_EXTRAS);
    let response = get(
        &app,
        "/v5/dims/resize/16x16",
        &format!("url={}&sig={}", IMAGE_URL, sig),
    )
    .await;
    assert_eq!(response.status, 200);

    let id = hex::encode(Sha256::digest(b"resize/16x16http://img/x.png"));
    let expected = hex::encode(Sha256::digest(format!("{}v1", id).as_bytes()));
    assert_eq!(response.header("ETag"), Some(expected.as_str()));
}

#[tokio::test]
async fn test_v5_download_sets_disposition() {
    let app = app_serving(png(32, 32, [1, 2, 3]));
    let sig = sign_v5_hex(SIGNING_KEY, "resize/16x16", IMAGE_URL, NO_EXTRAS);

    let response = get(
        &app,
        "/v5/resize/16x16",
        &format!("url={}&sig={}&download=1", IMAGE_URL, sig),
    )
    .await;
    assert_eq!(response.status, 200);
    assert_eq!(
        response.header("Content-Disposition"),
        Some("attachment; filename=x.png")
    );
}

#[tokio::test]
async fn test_v5_origin_cache_clamp() {
    let mut source = source(png(32, 32, [9, 9, 9]));
    source.cache_control = Some("public, max-age=60".to_string());

    let mut config = config();
    config.origin_cache_control.use_origin = true;
    config.origin_cache_control.min = 300;
    config.origin_cache_control.max = 3600;
    config.origin_cache_control.default = 86400;
    config.edge_control.downstream_ttl = 120;
    let app = app_with(config, StaticBackend::new().with(IMAGE_URL, source));

    let sig = sign_v5_hex(SIGNING_KEY, "resize/16x16", IMAGE_URL, NO_EXTRAS);
    let response = get(
        &app,
        "/v5/resize/16x16",
        &format!("url={}&sig={}", IMAGE_URL, sig),
    )
    .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.header("Cache-Control"), Some("max-age=300, public"));
    assert_eq!(response.header("Edge-Control"), Some("downstream-ttl=120"));
}

#[tokio::test]
async fn test_v5_upstream_status_propagates() {
    let app = app_with(config(), StaticBackend::new());
    let sig = sign_v5_hex(SIGNING_KEY, "resize/16x16", IMAGE_URL, NO_EXTRAS);

    let response = get(
        &app,
        "/v5/resize/16x16",
        &format!("url={}&sig={}", IMAGE_URL, sig),
    )
    .await;
    assert_eq!(response.status, 404);
    assert_eq!(response.header("Content-Type"), Some("image/jpeg"));
    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (16, 16));
}
