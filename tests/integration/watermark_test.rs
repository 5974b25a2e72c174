// Watermark overlays fetched through the `overlay` query parameter

use super::test_harness::*;
use dims::signing::sign_v5_hex;

const IMAGE_URL: &str = "http://img/base.png";
const OVERLAY_URL: &str = "http://img/logo.png";

fn app() -> dims::app::App {
    app_with(
        config(),
        StaticBackend::new()
            .with(IMAGE_URL, source(png(100, 100, [0, 0, 0])))
            .with(OVERLAY_URL, source(rgba_png(10, 10, [255, 255, 255, 255]))),
    )
}

fn query(commands: &str, extra: &str) -> String {
    let sig = sign_v5_hex(SIGNING_KEY, commands, IMAGE_URL, &[] as &[&str]);
    format!("url={}&sig={}{}", IMAGE_URL, sig, extra)
}

#[tokio::test]
async fn test_watermark_composites_overlay() {
    let commands = "watermark/1,0.5,nw";
    let response = get(
        &app(),
        &format!("/v5/{}", commands),
        &query(commands, &format!("&overlay={}", OVERLAY_URL)),
    )
    .await;

    assert_eq!(response.status, 200);
    let image = decode(&response).to_rgba8();
    assert_eq!((image.width(), image.height()), (100, 100));
    assert_eq!(image.get_pixel(10, 10).0[..3], [255, 255, 255]);
    assert_eq!(image.get_pixel(90, 90).0[..3], [0, 0, 0]);
}

#[tokio::test]
async fn test_watermark_without_overlay_param_fails() {
    let commands = "watermark/1,0.5,nw";
    let response = get(&app(), &format!("/v5/{}", commands), &query(commands, "")).await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn test_watermark_missing_overlay_image_fails() {
    let commands = "watermark/1,0.5,c";
    let response = get(
        &app(),
        &format!("/v5/{}", commands),
        &query(commands, "&overlay=http://img/missing.png"),
    )
    .await;
    assert_eq!(response.status, 400);
    assert_eq!(response.header("Content-Type"), Some("image/jpeg"));
}

#[tokio::test]
async fn test_watermark_overlay_is_cached() {
    let app = app();
    let commands = "watermark/0.5,0.2,se";
    let q = query(commands, &format!("&overlay={}", OVERLAY_URL));

    let first = get(&app, &format!("/v5/{}", commands), &q).await;
    let second = get(&app, &format!("/v5/{}", commands), &q).await;
    assert_eq!(first.status, 200);
    assert_eq!(first.body, second.body);
}
