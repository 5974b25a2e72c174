//! `thumbnail` and `legacy_thumbnail`.
//!
//! Both scale the image to cover the requested box and crop the overflow.
//! They differ in which part of the image they keep and in how a missing
//! height is treated.

use super::resize::{cover_and_crop, resize, scale_to, to_pixels, Anchor};
use crate::codec::ImageHandle;
use crate::error::DimsError;
use crate::geometry::Geometry;

fn parse(command: &str, args: &str) -> Result<Geometry, DimsError> {
    Geometry::parse(args).map_err(|e| DimsError::operation(command, args, e.to_string()))
}

/// Requested size with percentages resolved against the image
fn requested_size(geometry: &Geometry, image_width: u32, image_height: u32) -> (f64, f64) {
    let width = if geometry.flags.width_pct {
        image_width as f64 * geometry.width / 100.0
    } else {
        geometry.width
    };
    let height = if geometry.flags.height_pct {
        image_height as f64 * geometry.height / 100.0
    } else {
        geometry.height
    };
    (width, height)
}

/// Apply the `<` and `>` flags to a scale factor
fn constrain_scale(geometry: &Geometry, scale: f64) -> f64 {
    if geometry.flags.only_shrink && scale > 1.0 {
        1.0
    } else if geometry.flags.only_grow && scale < 1.0 {
        1.0
    } else {
        scale
    }
}

/// Cover-crop thumbnail anchored at the top-left
///
/// A missing axis is unbounded, so `200x` scales to 200 wide at the source
/// aspect ratio. `!` forces the exact size without cropping.
pub fn thumbnail(image: &mut ImageHandle, args: &str) -> Result<(), DimsError> {
    let geometry = parse("thumbnail", args)?;
    if geometry.flags.force {
        return resize(image, args);
    }

    let (iw, ih) = (image.width() as f64, image.height() as f64);
    let (width, height) = requested_size(&geometry, image.width(), image.height());

    if width <= 0.0 && height <= 0.0 {
        return Err(DimsError::operation(
            "thumbnail",
            args,
            "width or height must be greater than 0",
        ));
    }

    if height <= 0.0 || width <= 0.0 {
        let scale = if height <= 0.0 { width / iw } else { height / ih };
        let scale = constrain_scale(&geometry, scale);
        return scale_to(image, to_pixels(iw * scale), to_pixels(ih * scale));
    }

    let scale = constrain_scale(&geometry, (width / iw).max(height / ih));
    if scale == 1.0 && (geometry.flags.only_shrink || geometry.flags.only_grow) {
        return cover_and_crop(image, width.min(iw) as u32, height.min(ih) as u32, Anchor::Low);
    }
    cover_and_crop(image, to_pixels(width), to_pixels(height), Anchor::Low)
}

/// Centre-cropped thumbnail
///
/// Without a height, the result is half as tall as the aspect-preserving
/// size and keeps the bottom-right of the scaled image.
pub fn legacy_thumbnail(image: &mut ImageHandle, args: &str) -> Result<(), DimsError> {
    let geometry = parse("thumbnail", args)?;
    if geometry.flags.force {
        return resize(image, args).map_err(|e| rename_command(e, "thumbnail"));
    }

    let projected = geometry.project(image.width(), image.height());
    let (mut width, mut height) = requested_size(&geometry, image.width(), image.height());
    let mut anchor = Anchor::Centre;

    if width <= 0.0 {
        width = projected.width;
    }
    if height <= 0.0 {
        height = projected.height / 2.0;
        anchor = Anchor::High;
    }

    cover_and_crop(image, to_pixels(width), to_pixels(height), anchor)
}

fn rename_command(err: DimsError, name: &str) -> DimsError {
    match err {
        DimsError::Operation {
            status,
            message,
            args,
            ..
        } => DimsError::Operation {
            status,
            message,
            command: name.to_string(),
            args,
        },
        other => other,
    }
}
