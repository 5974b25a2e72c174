//! Image overlays ("watermarks").
//!
//! The `watermark` command takes `opacity,size,gravity`:
//!
//! - `opacity` in `[0,1]` scales the overlay's alpha
//! - `size` in `[0,1]` is the overlay's longest side as a fraction of the
//!   target's longest side
//! - `gravity` is one of `n, ne, nw, s, se, sw, w, e, c`
//!
//! The overlay itself comes from the `overlay` query parameter and is
//! fetched through the source backends, with decoded overlays cached in
//! memory by [`OverlayCache`].

pub mod compositor;
pub mod overlay;
pub mod position;

pub use compositor::{composite, source_over};
pub use overlay::OverlayCache;
pub use position::{calculate_position, Gravity, ImageDimensions, OverlayDimensions, PlacementPosition};

use image::DynamicImage;
use std::str::FromStr;

use crate::codec::{resize_exact, CodecError};

/// Parsed `opacity,size,gravity` arguments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkArgs {
    pub opacity: f64,
    pub size: f64,
    pub gravity: Gravity,
}

impl FromStr for WatermarkArgs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 {
            return Err(format!(
                "expected 3 comma-separated values, got {}",
                parts.len()
            ));
        }

        let opacity = parse_unit("opacity", parts[0])?;
        let size = parse_unit("size", parts[1])?;
        let gravity = parts[2].parse()?;

        Ok(Self {
            opacity,
            size,
            gravity,
        })
    }
}

fn parse_unit(name: &str, value: &str) -> Result<f64, String> {
    let parsed: f64 = value
        .parse()
        .map_err(|e| format!("invalid {} {:?}: {}", name, value, e))?;
    if !(0.0..=1.0).contains(&parsed) {
        return Err(format!("{} {} out of range [0.0,1.0]", name, parsed));
    }
    Ok(parsed)
}

/// Overlay size whose longest side is `size` times the target's longest side
pub fn overlay_dimensions(
    target_w: u32,
    target_h: u32,
    overlay_w: u32,
    overlay_h: u32,
    size: f64,
) -> (u32, u32) {
    let largest = target_w.max(target_h) as f64 * size;
    let scale = largest / overlay_w.max(overlay_h).max(1) as f64;
    (
        (overlay_w as f64 * scale).round() as u32,
        (overlay_h as f64 * scale).round() as u32,
    )
}

/// Composite `overlay` onto `target`
pub fn apply_watermark(
    target: &DynamicImage,
    overlay: &DynamicImage,
    args: &WatermarkArgs,
) -> Result<DynamicImage, CodecError> {
    let (ov_w, ov_h) = overlay_dimensions(
        target.width(),
        target.height(),
        overlay.width(),
        overlay.height(),
        args.size,
    );
    if ov_w == 0 || ov_h == 0 {
        return Ok(target.clone());
    }

    let scaled = resize_exact(overlay, ov_w, ov_h)?.to_rgba8();
    let mut canvas = target.to_rgba8();

    let position = calculate_position(
        args.gravity,
        &ImageDimensions {
            width: canvas.width(),
            height: canvas.height(),
        },
        &OverlayDimensions {
            width: ov_w,
            height: ov_h,
        },
    );

    composite(&mut canvas, &scaled, position, args);

    Ok(DynamicImage::ImageRgba8(canvas))
}
