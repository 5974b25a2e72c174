// Test harness: in-memory source backends and an App builder

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use dims::app::App;
use dims::config::Config;
use dims::error::DimsError;
use dims::request::{self, DimsResponse};
use dims::source::{BackendRegistry, SourceBackend, SourceImage};

pub const SIGNING_KEY: &str = "secret";

/// Serves fixed responses for `http://` URLs
#[derive(Default)]
pub struct StaticBackend {
    objects: HashMap<String, SourceImage>,
}

impl StaticBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, source: SourceImage) -> Self {
        self.objects.insert(url.to_string(), source);
        self
    }
}

#[async_trait]
impl SourceBackend for StaticBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    fn can_handle(&self, url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://")
    }

    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<SourceImage, DimsError> {
        match self.objects.get(url) {
            Some(source) => Ok(source.clone()),
            None => Ok(SourceImage {
                status: 404,
                ..Default::default()
            }),
        }
    }
}

pub fn config() -> Config {
    let mut config = Config::default();
    config.signing.signing_key = Some(SIGNING_KEY.to_string());
    config
}

pub fn app_with(config: Config, backend: StaticBackend) -> App {
    let mut registry = BackendRegistry::new();
    registry.register(Arc::new(backend));
    registry.set_default("http");
    App::with_registry(config, registry)
}

pub fn encode(image: DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut data = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut data), format)
        .expect("encode test image");
    data
}

/// Solid RGB PNG
pub fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color))),
        ImageOutputFormat::Png,
    )
}

/// Solid RGBA PNG
pub fn rgba_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color))),
        ImageOutputFormat::Png,
    )
}

pub fn jpeg(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color))),
        ImageOutputFormat::Jpeg(90),
    )
}

pub fn source(bytes: Vec<u8>) -> SourceImage {
    SourceImage::from_bytes(bytes)
}

pub async fn get(app: &App, path: &str, query: &str) -> DimsResponse {
    request::dispatch(app, path, query)
        .await
        .expect("path should route to a protocol")
}

pub fn decode(response: &DimsResponse) -> DynamicImage {
    image::load_from_memory(&response.body).expect("response body should be an image")
}
