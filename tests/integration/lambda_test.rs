// Lambda function URL and S3 Object Lambda events through the request core

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::test_harness::*;
use dims::lambda::function_url::{self, FunctionUrlRequest};
use dims::lambda::s3_object::{self, S3ObjectLambdaEvent};
use dims::signing::sign_v5_hex;

const IMAGE_URL: &str = "http://img/x.png";

fn app() -> dims::app::App {
    app_with(
        config(),
        StaticBackend::new().with(IMAGE_URL, source(png(100, 50, [5, 5, 5]))),
    )
}

#[tokio::test]
async fn test_function_url_returns_base64_image() {
    let sig = sign_v5_hex(SIGNING_KEY, "resize/20x20", IMAGE_URL, &[] as &[&str]);
    let event: FunctionUrlRequest = serde_json::from_value(serde_json::json!({
        "rawPath": "/v5/resize/20x20",
        "rawQueryString": format!("url={}&sig={}", IMAGE_URL, sig),
        "headers": {"host": "example.lambda-url.us-east-1.on.aws"}
    }))
    .unwrap();

    let response = function_url::handle(&app(), &event).await;
    assert_eq!(response.status_code, 200);
    assert!(response.is_base64_encoded);
    assert_eq!(
        response.headers.get("Content-Type").map(String::as_str),
        Some("image/png")
    );

    let body = STANDARD.decode(&response.body).unwrap();
    let image = image::load_from_memory(&body).unwrap();
    assert_eq!((image.width(), image.height()), (20, 10));

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["statusCode"], 200);
    assert_eq!(json["isBase64Encoded"], true);
}

#[tokio::test]
async fn test_function_url_rejects_foreign_paths() {
    let event = FunctionUrlRequest {
        raw_path: "/images/x.png".to_string(),
        ..Default::default()
    };
    let response = function_url::handle(&app(), &event).await;
    assert_eq!(response.status_code, 400);

    let body = STANDARD.decode(&response.body).unwrap();
    assert!(String::from_utf8(body)
        .unwrap()
        .contains("path must start with /dims4/ or /v5/"));
}

#[tokio::test]
async fn test_s3_object_lambda_renders_user_request() {
    let sig = sign_v5_hex(SIGNING_KEY, "resize/10x10", IMAGE_URL, &[] as &[&str]);
    let event: S3ObjectLambdaEvent = serde_json::from_value(serde_json::json!({
        "getObjectContext": {
            "inputS3Url": "https://bucket.s3.amazonaws.com/x.png?X-Amz-Signature=abc",
            "outputRoute": "io-route",
            "outputToken": "io-token"
        },
        "userRequest": {
            "url": format!("https://ap.s3-object-lambda.amazonaws.com/v5/resize/10x10?url={}&sig={}", IMAGE_URL, sig)
        }
    }))
    .unwrap();

    let response = s3_object::render(&app(), &event).await;
    assert_eq!(response.status, 200);
    let image = decode(&response);
    assert_eq!((image.width(), image.height()), (10, 5));
}
