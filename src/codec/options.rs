//! Export (encoding) parameters.
//!
//! Seeded from [`Config`] for every request and mutated by the `strip`,
//! `format` and `quality` commands before encoding.

use super::ImageType;
use crate::config::{Config, WebpCompression};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegParams {
    pub quality: u8,
    pub strip: bool,
    pub interlace: bool,
    pub optimize_coding: bool,
    pub subsample_mode: bool,
    pub trellis_quant: bool,
    pub overshoot_deringing: bool,
    pub optimize_scans: bool,
    pub quant_table: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngParams {
    pub quality: u8,
    pub strip: bool,
    pub interlace: bool,
    /// zlib level 0-9
    pub compression: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebpParams {
    pub quality: u8,
    pub strip: bool,
    pub compression: WebpCompression,
    pub reduction_effort: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GifParams {
    pub strip: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiffParams {
    pub quality: u8,
    pub strip: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub image_type: ImageType,
    pub jpeg: JpegParams,
    pub png: PngParams,
    pub webp: WebpParams,
    pub gif: GifParams,
    pub tiff: TiffParams,
}

impl ExportOptions {
    /// Options for encoding to `image_type` with the codec settings of `config`
    pub fn from_config(config: &Config, image_type: ImageType) -> Self {
        let strip = config.options.strip_metadata;
        let jpeg = &config.jpeg;

        Self {
            image_type,
            jpeg: JpegParams {
                quality: jpeg.quality,
                strip,
                interlace: jpeg.interlace,
                optimize_coding: jpeg.optimize_coding,
                subsample_mode: jpeg.subsample_mode,
                trellis_quant: jpeg.trellis_quant,
                overshoot_deringing: jpeg.overshoot_deringing,
                optimize_scans: jpeg.optimize_scans,
                quant_table: jpeg.quant_table,
            },
            png: PngParams {
                quality: config.png.quality,
                strip,
                interlace: config.png.interlace,
                compression: config.png.compression,
            },
            webp: WebpParams {
                quality: config.webp.quality,
                strip,
                compression: config.webp.compression,
                reduction_effort: config.webp.reduction_effort,
            },
            gif: GifParams { strip },
            tiff: TiffParams {
                quality: config.jpeg.quality,
                strip,
            },
        }
    }

    /// Set `strip` on every codec
    pub fn set_strip(&mut self, strip: bool) {
        self.jpeg.strip = strip;
        self.png.strip = strip;
        self.webp.strip = strip;
        self.gif.strip = strip;
        self.tiff.strip = strip;
    }

    /// Set quality on every codec that has one
    pub fn set_quality(&mut self, quality: u8) {
        self.jpeg.quality = quality;
        self.png.quality = quality;
        self.webp.quality = quality;
        self.tiff.quality = quality;
    }

    /// Whether the selected output type strips metadata
    pub fn strip(&self) -> bool {
        match self.image_type {
            ImageType::Jpeg => self.jpeg.strip,
            ImageType::Png => self.png.strip,
            ImageType::Webp => self.webp.strip,
            ImageType::Gif => self.gif.strip,
            ImageType::Tiff | ImageType::Svg => self.tiff.strip,
        }
    }
}
