//! Image codec layer
//!
//! Provides:
//! - Format detection from magic bytes
//! - Decoding with EXIF auto-orientation and JPEG shrink-on-load
//! - The mutable [`ImageHandle`] that commands operate on
//! - Per-format encoders driven by [`ExportOptions`]
//! - Lanczos-3 resampling

pub mod decoder;
pub mod encoder;
pub mod format;
pub mod options;
pub mod resize;

pub use decoder::{decode, probe, Probe};
pub use encoder::{EncodedImage, EncoderFactory, ImageEncoder};
pub use format::ImageType;
pub use options::{ExportOptions, GifParams, JpegParams, PngParams, TiffParams, WebpParams};
pub use resize::resize_exact;

use image::DynamicImage;
use std::fmt;

use crate::error::DimsError;

/// Errors raised by decoding, resampling and encoding
#[derive(Debug, Clone)]
pub enum CodecError {
    /// Format name or bytes not recognised
    UnsupportedFormat { format: String },
    /// Failed to decode image data
    DecodeFailed { message: String },
    /// Resample failed
    ResizeFailed { message: String },
    /// Encoding to output format failed
    EncodeFailed { format: String, message: String },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnsupportedFormat { format } => {
                write!(f, "Unsupported image format: {}", format)
            }
            CodecError::DecodeFailed { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
            CodecError::ResizeFailed { message } => write!(f, "Resize failed: {}", message),
            CodecError::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
        }
    }
}

impl std::error::Error for CodecError {}

impl CodecError {
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        CodecError::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        CodecError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn resize_failed(message: impl Into<String>) -> Self {
        CodecError::ResizeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }
}

impl From<CodecError> for DimsError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::UnsupportedFormat { .. } => DimsError::bad_request(err.to_string()),
            _ => DimsError::internal(err.to_string()),
        }
    }
}

/// A decoded image plus the metadata carried alongside it
#[derive(Debug, Clone)]
pub struct ImageHandle {
    image: DynamicImage,
    exif: Option<Vec<u8>>,
}

impl ImageHandle {
    pub fn new(image: DynamicImage) -> Self {
        Self { image, exif: None }
    }

    /// Attach raw EXIF (TIFF-structured) metadata
    pub fn with_exif(mut self, exif: Option<Vec<u8>>) -> Self {
        self.exif = exif;
        self
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Replace the pixels, keeping metadata
    pub fn set_image(&mut self, image: DynamicImage) {
        self.image = image;
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    pub fn exif(&self) -> Option<&[u8]> {
        self.exif.as_deref()
    }

    /// Drop every piece of metadata carried with the pixels
    pub fn remove_metadata(&mut self) {
        self.exif = None;
    }

    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }
}
