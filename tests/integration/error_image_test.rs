// Error image rendering for pipeline, fetch and signature failures

use super::test_harness::*;
use dims::signing::sign_v5_hex;

const IMAGE_URL: &str = "http://img/square.png";

fn signed_query(commands: &str) -> String {
    let sig = sign_v5_hex(SIGNING_KEY, commands, IMAGE_URL, &[] as &[&str]);
    format!("url={}&sig={}", IMAGE_URL, sig)
}

#[tokio::test]
async fn test_crop_out_of_bounds_renders_error_image() {
    let mut source = source(png(512, 512, [0, 255, 0]));
    source.etag = Some("abc".to_string());
    source.last_modified = Some("Mon, 01 Jan 2024 00:00:00 GMT".to_string());

    let mut config = config();
    config.edge_control.downstream_ttl = 30;
    let app = app_with(config, StaticBackend::new().with(IMAGE_URL, source));

    let commands = "crop/256x256+768+768";
    let response = get(&app, &format!("/v5/{}", commands), &signed_query(commands)).await;

    assert_eq!(response.status, 400);
    assert_eq!(response.header("Content-Type"), Some("image/jpeg"));
    assert_eq!(response.header("Cache-Control"), Some("max-age=60, public"));
    assert!(response.header("Expires").is_some());
    assert_eq!(response.header("Edge-Control"), Some("downstream-ttl=30"));
    assert!(response.header("ETag").is_none());
    assert!(response.header("Last-Modified").is_none());

    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (256, 256));
}

#[tokio::test]
async fn test_error_image_uses_configured_background() {
    let mut config = config();
    config.error.background = "#ff0000".to_string();
    let app = app_with(config, StaticBackend::new());

    let commands = "resize/40x40";
    let response = get(&app, &format!("/v5/{}", commands), &signed_query(commands)).await;
    assert_eq!(response.status, 404);

    let pixel = decode(&response).to_rgb8().get_pixel(20, 20).0;
    assert!(pixel[0] > 200, "red channel was {}", pixel[0]);
    assert!(pixel[1] < 60 && pixel[2] < 60, "pixel was {:?}", pixel);
}

#[tokio::test]
async fn test_error_image_replays_thumbnail_as_resize() {
    let app = app_with(config(), StaticBackend::new());

    let commands = "thumbnail/120x80";
    let response = get(&app, &format!("/v5/{}", commands), &signed_query(commands)).await;
    assert_eq!(response.status, 404);
    let image = decode(&response);
    // 512 square resized to fit 120x80 keeps its aspect ratio
    assert_eq!((image.width(), image.height()), (80, 80));
}

#[tokio::test]
async fn test_error_image_honours_format_command() {
    let app = app_with(config(), StaticBackend::new());

    let commands = "resize/10x10/format/png";
    let response = get(&app, &format!("/v5/{}", commands), &signed_query(commands)).await;
    assert_eq!(response.status, 404);
    assert_eq!(response.header("Content-Type"), Some("image/png"));
}

#[tokio::test]
async fn test_undecodable_source_is_an_error_image() {
    let app = app_with(
        config(),
        StaticBackend::new().with(IMAGE_URL, source(b"not an image".to_vec())),
    );

    let commands = "resize/10x10";
    let response = get(&app, &format!("/v5/{}", commands), &signed_query(commands)).await;
    assert!(response.status >= 400);
    assert!(response.header("Content-Type").unwrap().starts_with("image/"));
}
