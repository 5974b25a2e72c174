// HTTP source backend against a local canned-response server

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use super::test_harness::*;
use dims::app::App;
use dims::codec::ImageType;
use dims::constants::user_agent;
use dims::source::{HttpBackend, SourceBackend};

/// Serve `head` + `body` to every connection after `delay`, reporting each request head
async fn spawn_server(
    head: String,
    body: Vec<u8>,
    delay: Duration,
) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let head = head.clone();
            let body = body.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buffer = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buffer).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buffer[..n]),
                    }
                }
                let _ = tx.send(String::from_utf8_lossy(&request).to_string());

                tokio::time::sleep(delay).await;
                let response = format!("{}Content-Length: {}\r\n\r\n", head, body.len());
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.write_all(&body).await;
            });
        }
    });

    (addr, rx)
}

fn ok_head(extra: &str) -> String {
    format!("HTTP/1.1 200 OK\r\nContent-Type: image/png\r\n{}", extra)
}

#[tokio::test]
async fn test_fetch_surfaces_upstream_metadata() {
    let head = ok_head(
        "Cache-Control: max-age=300, public\r\n\
         ETag: \"v1\"\r\n\
         Last-Modified: Wed, 21 Oct 2015 07:28:00 GMT\r\n\
         Edge-Control: downstream-ttl=60\r\n",
    );
    let (addr, mut requests) = spawn_server(head, png(8, 4, [1, 2, 3]), Duration::ZERO).await;

    let backend = HttpBackend::new().unwrap();
    let url = format!("http://{}/img.png", addr);
    let source = backend.fetch(&url, Duration::from_secs(5)).await.unwrap();

    assert_eq!(source.status, 200);
    assert_eq!(source.format, Some(ImageType::Png));
    assert_eq!(source.size, source.bytes.len());
    assert_eq!(source.cache_control.as_deref(), Some("max-age=300, public"));
    assert_eq!(source.etag.as_deref(), Some("\"v1\""));
    assert_eq!(
        source.last_modified.as_deref(),
        Some("Wed, 21 Oct 2015 07:28:00 GMT")
    );
    assert_eq!(source.edge_control.as_deref(), Some("downstream-ttl=60"));

    let request = requests.recv().await.unwrap().to_lowercase();
    assert!(request.starts_with("get /img.png http/1.1"));
    assert!(
        request.contains(&format!("user-agent: {}", user_agent().to_lowercase())),
        "request was {}",
        request
    );
}

#[tokio::test]
async fn test_fetch_passes_upstream_status_through() {
    let head = "HTTP/1.1 404 Not Found\r\n".to_string();
    let (addr, _requests) = spawn_server(head, b"missing".to_vec(), Duration::ZERO).await;

    let backend = HttpBackend::new().unwrap();
    let err = backend
        .fetch(&format!("http://{}/gone.png", addr), Duration::from_secs(5))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    let head = "HTTP/1.1 503 Service Unavailable\r\n".to_string();
    let (addr, _requests) = spawn_server(head, Vec::new(), Duration::ZERO).await;
    let err = backend
        .fetch(&format!("http://{}/busy.png", addr), Duration::from_secs(5))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 503);
}

#[tokio::test]
async fn test_fetch_timeout_maps_to_504() {
    let (addr, _requests) =
        spawn_server(ok_head(""), png(2, 2, [0, 0, 0]), Duration::from_secs(5)).await;

    let backend = HttpBackend::new().unwrap();
    let err = backend
        .fetch(&format!("http://{}/slow.png", addr), Duration::from_millis(200))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 504);
}

#[tokio::test]
async fn test_connection_refused_is_bad_request() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new().unwrap();
    let err = backend
        .fetch(&format!("http://{}/x.png", addr), Duration::from_secs(2))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_request_through_http_backend() {
    let head = ok_head("Cache-Control: max-age=600, public\r\n");
    let (addr, _requests) = spawn_server(head, png(40, 20, [9, 9, 9]), Duration::ZERO).await;

    let mut config = config();
    config.origin_cache_control.use_origin = true;
    config.origin_cache_control.min = 60;
    config.origin_cache_control.max = 3600;
    let app = App::new(config).unwrap();

    let url = format!("http://{}/photo.png", addr);
    let commands = "resize/20x20";
    let sig = dims::signing::sign_v5_hex(SIGNING_KEY, commands, &url, &[] as &[&str]);
    let query = format!("url={}&sig={}", urlencoding::encode(&url), sig);

    let response = get(&app, "/v5/resize/20x20", &query).await;
    assert_eq!(response.status, 200);
    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (20, 10));
    assert_eq!(response.header("Cache-Control"), Some("max-age=600, public"));
}

#[tokio::test]
async fn test_upstream_404_renders_error_image() {
    let head = "HTTP/1.1 404 Not Found\r\n".to_string();
    let (addr, _requests) = spawn_server(head, Vec::new(), Duration::ZERO).await;
    let app = App::new(config()).unwrap();

    let url = format!("http://{}/gone.png", addr);
    let commands = "resize/16x16";
    let sig = dims::signing::sign_v5_hex(SIGNING_KEY, commands, &url, &[] as &[&str]);
    let query = format!("url={}&sig={}", urlencoding::encode(&url), sig);

    let response = get(&app, "/v5/resize/16x16", &query).await;
    assert_eq!(response.status, 404);
    assert_eq!(response.header("Content-Type"), Some("image/jpeg"));
}
