//! Image type names and magic-byte detection

use std::fmt;
use std::str::FromStr;

use super::CodecError;

/// Image formats understood by the gateway
///
/// SVG is only ever detected on input; it cannot be selected as output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    Jpeg,
    Png,
    Webp,
    Gif,
    Tiff,
    Svg,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Jpeg => "jpeg",
            ImageType::Png => "png",
            ImageType::Webp => "webp",
            ImageType::Gif => "gif",
            ImageType::Tiff => "tiff",
            ImageType::Svg => "svg",
        }
    }

    /// Content-Type header value
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageType::Jpeg => "image/jpeg",
            ImageType::Png => "image/png",
            ImageType::Webp => "image/webp",
            ImageType::Gif => "image/gif",
            ImageType::Tiff => "image/tiff",
            ImageType::Svg => "image/svg+xml",
        }
    }

    /// Detect the format from the leading bytes of `data`
    pub fn detect(data: &[u8]) -> Option<ImageType> {
        match image::guess_format(data) {
            Ok(image::ImageFormat::Jpeg) => Some(ImageType::Jpeg),
            Ok(image::ImageFormat::Png) => Some(ImageType::Png),
            Ok(image::ImageFormat::WebP) => Some(ImageType::Webp),
            Ok(image::ImageFormat::Gif) => Some(ImageType::Gif),
            Ok(image::ImageFormat::Tiff) => Some(ImageType::Tiff),
            _ if looks_like_svg(data) => Some(ImageType::Svg),
            _ => None,
        }
    }

    pub(crate) fn image_format(&self) -> Option<image::ImageFormat> {
        match self {
            ImageType::Jpeg => Some(image::ImageFormat::Jpeg),
            ImageType::Png => Some(image::ImageFormat::Png),
            ImageType::Webp => Some(image::ImageFormat::WebP),
            ImageType::Gif => Some(image::ImageFormat::Gif),
            ImageType::Tiff => Some(image::ImageFormat::Tiff),
            ImageType::Svg => None,
        }
    }
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(1024)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start();
    (trimmed.starts_with("<svg") || trimmed.starts_with("<?xml")) && text.contains("<svg")
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageType {
    type Err = CodecError;

    /// Parse an output format name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ImageType::Jpeg),
            "png" => Ok(ImageType::Png),
            "webp" => Ok(ImageType::Webp),
            "gif" => Ok(ImageType::Gif),
            "tiff" | "tif" => Ok(ImageType::Tiff),
            _ => Err(CodecError::unsupported_format(s)),
        }
    }
}
