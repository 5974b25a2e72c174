//! `sharpen/RxS` unsharp mask.
//!
//! The geometry width is the flat-area threshold below which differences
//! are left alone; the height scales the boost applied above it.

use image::{imageops, DynamicImage, RgbaImage};

use crate::codec::ImageHandle;
use crate::error::DimsError;
use crate::geometry::Geometry;

const BLUR_SIGMA: f32 = 0.5;

pub fn sharpen(image: &mut ImageHandle, args: &str) -> Result<(), DimsError> {
    let geometry =
        Geometry::parse(args).map_err(|e| DimsError::operation("sharpen", args, e.to_string()))?;

    let threshold = geometry.width;
    let boost = if geometry.height == 0.0 {
        2.0
    } else {
        geometry.height * 2.0
    };

    let sharpened = unsharp(image.image(), threshold, boost);
    image.set_image(sharpened);
    Ok(())
}

fn unsharp(image: &DynamicImage, threshold: f64, boost: f64) -> DynamicImage {
    let original = image.to_rgba8();
    let blurred = imageops::blur(&original, BLUR_SIGMA);

    let mut out = RgbaImage::new(original.width(), original.height());
    for ((dst, src), soft) in out
        .pixels_mut()
        .zip(original.pixels())
        .zip(blurred.pixels())
    {
        for c in 0..3 {
            let value = src[c] as f64;
            let diff = value - soft[c] as f64;
            let adjusted = if diff.abs() > threshold {
                value + boost * diff
            } else {
                value
            };
            dst[c] = adjusted.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = src[3];
    }

    restore_color(image, DynamicImage::ImageRgba8(out))
}

/// Convert `processed` back to the colour layout of `original`
pub(crate) fn restore_color(original: &DynamicImage, processed: DynamicImage) -> DynamicImage {
    match original {
        DynamicImage::ImageLuma8(_) => DynamicImage::ImageLuma8(processed.to_luma8()),
        DynamicImage::ImageLumaA8(_) => DynamicImage::ImageLumaA8(processed.to_luma_alpha8()),
        DynamicImage::ImageRgb8(_) => DynamicImage::ImageRgb8(processed.to_rgb8()),
        _ => processed,
    }
}
