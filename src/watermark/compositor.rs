//! Source-over compositing of a scaled overlay onto the target canvas.
//!
//! Blending happens on premultiplied values: the overlay's alpha is first
//! scaled by the `watermark` opacity, then `out = src + dst * (1 - src_alpha)`
//! per channel, and the result is divided back out by its alpha.

use image::{Rgba, RgbaImage};

use super::position::PlacementPosition;
use super::WatermarkArgs;

/// Canvas rectangle `[x0, x1) x [y0, y1)` covered by an overlay at `origin`
fn covered_region(
    canvas: &RgbaImage,
    overlay: &RgbaImage,
    origin: PlacementPosition,
) -> Option<(u32, u32, u32, u32)> {
    let clip = |start: i32, len: u32, bound: u32| {
        let lo = start.max(0) as i64;
        let hi = (start as i64 + len as i64).min(bound as i64);
        (lo < hi).then_some((lo as u32, hi as u32))
    };
    let (x0, x1) = clip(origin.x, overlay.width(), canvas.width())?;
    let (y0, y1) = clip(origin.y, overlay.height(), canvas.height())?;
    Some((x0, y0, x1, y1))
}

/// Draw `overlay` with its top-left corner at `origin`, clipped to the canvas
pub fn composite(
    canvas: &mut RgbaImage,
    overlay: &RgbaImage,
    origin: PlacementPosition,
    args: &WatermarkArgs,
) {
    let Some((x0, y0, x1, y1)) = covered_region(canvas, overlay, origin) else {
        return;
    };
    let opacity = args.opacity.clamp(0.0, 1.0) as f32;

    for y in y0..y1 {
        let oy = (y as i64 - origin.y as i64) as u32;
        for x in x0..x1 {
            let ox = (x as i64 - origin.x as i64) as u32;
            let src = *overlay.get_pixel(ox, oy);
            let dst = canvas.get_pixel_mut(x, y);
            *dst = source_over(*dst, src, opacity);
        }
    }
}

/// One premultiplied source-over step; `opacity` scales the source alpha
pub fn source_over(dst: Rgba<u8>, src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let src_alpha = src[3] as f32 / 255.0 * opacity;
    let dst_alpha = dst[3] as f32 / 255.0;
    let keep = 1.0 - src_alpha;

    let out_alpha = src_alpha + dst_alpha * keep;
    if out_alpha <= f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for (c, value) in out.iter_mut().take(3).enumerate() {
        let src_p = src[c] as f32 * src_alpha;
        let dst_p = dst[c] as f32 * dst_alpha;
        *value = ((src_p + dst_p * keep) / out_alpha).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_alpha * 255.0).round() as u8;
    Rgba(out)
}
