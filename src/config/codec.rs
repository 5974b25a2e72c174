//! Per-codec export tuning.
//!
//! These values seed the export options of every request. Commands such as
//! `quality` and `strip` then adjust the per-request copy.
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_JPEG_QUALITY, DEFAULT_JPEG_QUANT_TABLE, DEFAULT_PNG_COMPRESSION, DEFAULT_PNG_QUALITY,
    DEFAULT_WEBP_QUALITY, DEFAULT_WEBP_REDUCTION_EFFORT,
};

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_quant_table() -> u8 {
    DEFAULT_JPEG_QUANT_TABLE
}

fn default_png_quality() -> u8 {
    DEFAULT_PNG_QUALITY
}

fn default_png_compression() -> u8 {
    DEFAULT_PNG_COMPRESSION
}

fn default_webp_quality() -> u8 {
    DEFAULT_WEBP_QUALITY
}

fn default_reduction_effort() -> u8 {
    DEFAULT_WEBP_REDUCTION_EFFORT
}

fn default_true() -> bool {
    true
}

/// JPEG encoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JpegConfig {
    #[serde(default = "default_jpeg_quality")]
    pub quality: u8,
    #[serde(default)]
    pub interlace: bool,
    #[serde(default = "default_true")]
    pub optimize_coding: bool,
    #[serde(default = "default_true")]
    pub subsample_mode: bool,
    #[serde(default)]
    pub trellis_quant: bool,
    #[serde(default)]
    pub overshoot_deringing: bool,
    #[serde(default)]
    pub optimize_scans: bool,
    #[serde(default = "default_quant_table")]
    pub quant_table: u8,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            quality: default_jpeg_quality(),
            interlace: false,
            optimize_coding: true,
            subsample_mode: true,
            trellis_quant: false,
            overshoot_deringing: false,
            optimize_scans: false,
            quant_table: default_quant_table(),
        }
    }
}

/// PNG encoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PngConfig {
    #[serde(default = "default_png_quality")]
    pub quality: u8,
    #[serde(default)]
    pub interlace: bool,
    /// zlib effort, 0 (store) to 9 (best)
    #[serde(default = "default_png_compression")]
    pub compression: u8,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self {
            quality: default_png_quality(),
            interlace: false,
            compression: default_png_compression(),
        }
    }
}

/// WebP compression mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebpCompression {
    #[default]
    Lossy,
    NearLossless,
    Lossless,
}

impl FromStr for WebpCompression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lossy" => Ok(WebpCompression::Lossy),
            "near_lossless" => Ok(WebpCompression::NearLossless),
            "lossless" => Ok(WebpCompression::Lossless),
            other => Err(format!("unknown webp compression '{}'", other)),
        }
    }
}

impl fmt::Display for WebpCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WebpCompression::Lossy => "lossy",
            WebpCompression::NearLossless => "near_lossless",
            WebpCompression::Lossless => "lossless",
        };
        f.write_str(name)
    }
}

/// WebP encoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebpConfig {
    #[serde(default = "default_webp_quality")]
    pub quality: u8,
    #[serde(default)]
    pub compression: WebpCompression,
    #[serde(default = "default_reduction_effort")]
    pub reduction_effort: u8,
}

impl Default for WebpConfig {
    fn default() -> Self {
        Self {
            quality: default_webp_quality(),
            compression: WebpCompression::default(),
            reduction_effort: default_reduction_effort(),
        }
    }
}
