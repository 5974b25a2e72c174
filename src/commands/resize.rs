//! `resize/WxH` and the shared resampling helpers.

use crate::codec::{resize_exact, ImageHandle};
use crate::constants::{MAX_IMAGE_DIMENSION, MAX_IMAGE_PIXELS};
use crate::error::DimsError;
use crate::geometry::Geometry;

/// Which part of an oversized image survives a crop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    /// Keep the top-left corner
    Low,
    Centre,
    /// Keep the bottom-right corner
    High,
}

/// Round a projected dimension to whole pixels, kept within `1..=MAX_IMAGE_DIMENSION`
pub(crate) fn to_pixels(value: f64) -> u32 {
    if value.is_nan() {
        return 1;
    }
    value.round().clamp(1.0, MAX_IMAGE_DIMENSION as f64) as u32
}

/// Resample the handle to exactly `width` x `height`
pub(crate) fn scale_to(image: &mut ImageHandle, width: u32, height: u32) -> Result<(), DimsError> {
    if width == image.width() && height == image.height() {
        return Ok(());
    }
    if width as u64 * height as u64 > MAX_IMAGE_PIXELS {
        return Err(DimsError::status(
            400,
            format!("output of {}x{} exceeds {} pixels", width, height, MAX_IMAGE_PIXELS),
        ));
    }
    let resized = resize_exact(image.image(), width, height)?;
    image.set_image(resized);
    Ok(())
}

/// Scale to cover `width` x `height`, then crop the overflow around `anchor`
pub(crate) fn cover_and_crop(
    image: &mut ImageHandle,
    width: u32,
    height: u32,
    anchor: Anchor,
) -> Result<(), DimsError> {
    let (iw, ih) = (image.width() as f64, image.height() as f64);
    let scale = (width as f64 / iw).max(height as f64 / ih);
    scale_to(image, to_pixels(iw * scale), to_pixels(ih * scale))?;

    let (sw, sh) = (image.width(), image.height());
    let (cw, ch) = (width.min(sw), height.min(sh));
    if (cw, ch) == (sw, sh) {
        return Ok(());
    }

    let (x, y) = match anchor {
        Anchor::Low => (0, 0),
        Anchor::Centre => ((sw - cw) / 2, (sh - ch) / 2),
        Anchor::High => (sw - cw, sh - ch),
    };
    let cropped = image.image().crop_imm(x, y, cw, ch);
    image.set_image(cropped);
    Ok(())
}

pub fn resize(image: &mut ImageHandle, args: &str) -> Result<(), DimsError> {
    let geometry =
        Geometry::parse(args).map_err(|e| DimsError::operation("resize", args, e.to_string()))?;
    let projected = geometry.project(image.width(), image.height());

    scale_to(image, to_pixels(projected.width), to_pixels(projected.height))
}
