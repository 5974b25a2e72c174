// Command pipeline behaviour observed through full requests

use super::test_harness::*;
use dims::signing::sign_v5_hex;

const IMAGE_URL: &str = "http://img/src";

async fn run(app: &dims::app::App, commands: &str) -> dims::request::DimsResponse {
    let sig = sign_v5_hex(SIGNING_KEY, commands, IMAGE_URL, &[] as &[&str]);
    get(
        app,
        &format!("/v5/{}", commands),
        &format!("url={}&sig={}", IMAGE_URL, sig),
    )
    .await
}

fn serving(bytes: Vec<u8>) -> dims::app::App {
    app_with(config(), StaticBackend::new().with(IMAGE_URL, source(bytes)))
}

#[tokio::test]
async fn test_command_order_matters() {
    let app = serving(png(200, 100, [50, 50, 50]));

    let crop_first = run(&app, "crop/100x100+0+0/resize/50x50").await;
    assert_eq!(crop_first.status, 200);
    let image = decode(&crop_first);
    assert_eq!((image.width(), image.height()), (50, 50));

    let resize_first = run(&app, "resize/50x50/crop/100x100+0+0").await;
    assert_eq!(resize_first.status, 200);
    let image = decode(&resize_first);
    assert_eq!((image.width(), image.height()), (50, 25));
}

#[tokio::test]
async fn test_jpeg_shrink_on_load_keeps_requested_size() {
    let app = serving(jpeg(2000, 1000, [90, 120, 150]));

    let response = run(&app, "crop/1000x500+0+0/resize/100x100").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Type"), Some("image/jpeg"));
    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (100, 50));
}

#[tokio::test]
async fn test_thumbnail_fills_box() {
    let app = serving(png(400, 200, [0, 0, 0]));

    let response = run(&app, "thumbnail/100x100").await;
    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (100, 100));
}

#[tokio::test]
async fn test_format_conversion() {
    let app = serving(png(40, 40, [200, 100, 0]));

    let response = run(&app, "resize/20x20/format/webp").await;
    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Type"), Some("image/webp"));

    let response = run(&app, "format/jpg/quality/50").await;
    assert_eq!(response.header("Content-Type"), Some("image/jpeg"));
}

#[tokio::test]
async fn test_unsupported_format_is_bad_request() {
    let app = serving(png(40, 40, [200, 100, 0]));

    let response = run(&app, "format/bmp").await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn test_default_output_format_respects_exclusions() {
    let mut config = config();
    config.output_format.default = Some("webp".to_string());
    config.output_format.excluded = vec!["gif".to_string()];

    let app = app_with(
        config.clone(),
        StaticBackend::new().with(IMAGE_URL, source(png(10, 10, [1, 2, 3]))),
    );
    let response = run(&app, "resize/5x5").await;
    assert_eq!(response.header("Content-Type"), Some("image/webp"));

    let gif = encode(
        image::DynamicImage::ImageRgb8(image::RgbImage::new(10, 10)),
        image::ImageOutputFormat::Gif,
    );
    let app = app_with(config, StaticBackend::new().with(IMAGE_URL, source(gif)));
    let response = run(&app, "resize/5x5").await;
    assert_eq!(response.header("Content-Type"), Some("image/png"));
}

#[tokio::test]
async fn test_rotate_and_grayscale() {
    let app = serving(png(30, 10, [255, 0, 0]));

    let response = run(&app, "rotate/90/grayscale/true").await;
    assert_eq!(response.status, 200);
    let image = decode(&response).to_rgb8();
    assert_eq!(image.dimensions(), (10, 30));
    let [r, g, b] = image.get_pixel(5, 15).0;
    assert!(r.abs_diff(g) <= 1 && g.abs_diff(b) <= 1);
}

#[tokio::test]
async fn test_unknown_commands_are_ignored() {
    let app = serving(png(30, 10, [0, 0, 0]));

    let response = run(&app, "bogus/1/resize/15x5").await;
    assert_eq!(response.status, 200);
    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (15, 5));
}

#[tokio::test]
async fn test_unknown_command_between_known_ones() {
    let app = serving(png(400, 200, [0, 0, 0]));

    let response = run(&app, "resize/100x/frobnicate/yes").await;
    assert_eq!(response.status, 200);
    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (100, 50));
}
