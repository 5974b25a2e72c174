// End-to-end requests served from the file backend

use std::fs;

use super::test_harness::*;
use dims::app::App;
use dims::signing::sign_v5_hex;

fn signed_query(commands: &str, url: &str) -> String {
    let sig = sign_v5_hex(SIGNING_KEY, commands, url, &[] as &[&str]);
    format!("url={}&sig={}", url, sig)
}

fn file_app(base_dir: &std::path::Path) -> App {
    let mut config = config();
    config.source.default = "file".to_string();
    config.source.allowed = vec!["file".to_string()];
    config.file.base_dir = base_dir.display().to_string();
    App::new(config).unwrap()
}

#[tokio::test]
async fn test_file_source_resize() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("photo.png"), png(64, 32, [10, 20, 30])).unwrap();
    let app = file_app(dir.path());

    let url = "file://photo.png";
    let response = get(&app, "/v5/resize/32x32", &signed_query("resize/32x32", url)).await;
    assert_eq!(response.status, 200);
    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (32, 16));
}

#[tokio::test]
async fn test_file_source_bare_path_uses_default_backend() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested/a.png"), png(20, 20, [1, 1, 1])).unwrap();
    let app = file_app(dir.path());

    let url = "nested/a.png";
    let response = get(&app, "/v5/resize/10x10", &signed_query("resize/10x10", url)).await;
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_file_source_traversal_stays_in_base_dir() {
    let outer = tempfile::tempdir().unwrap();
    let base = outer.path().join("images");
    fs::create_dir(&base).unwrap();
    fs::write(outer.path().join("secret.png"), png(8, 8, [0, 0, 0])).unwrap();
    let app = file_app(&base);

    let url = "file://../secret.png";
    let response = get(&app, "/v5/resize/4x4", &signed_query("resize/4x4", url)).await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_missing_file_is_404_error_image() {
    let dir = tempfile::tempdir().unwrap();
    let app = file_app(dir.path());

    let url = "/nope.png";
    let response = get(&app, "/v5/resize/16x16", &signed_query("resize/16x16", url)).await;
    assert_eq!(response.status, 404);
    assert_eq!(response.header("Content-Type"), Some("image/jpeg"));
}

#[tokio::test]
async fn test_disabled_backend_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = file_app(dir.path());

    let url = "http://img/x.png";
    let response = get(&app, "/v5/resize/16x16", &signed_query("resize/16x16", url)).await;
    assert_eq!(response.status, 400);
}
