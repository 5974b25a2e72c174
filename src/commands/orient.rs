//! Mirroring and rotation.

use image::{DynamicImage, Rgba, RgbaImage};

use crate::codec::ImageHandle;
use crate::error::DimsError;

/// `flipflop/horizontal` mirrors left-right, `flipflop/vertical` top-bottom
pub fn flipflop(image: &mut ImageHandle, args: &str) -> Result<(), DimsError> {
    let flipped = match args {
        "horizontal" => image.image().fliph(),
        "vertical" => image.image().flipv(),
        _ => return Ok(()),
    };
    image.set_image(flipped);
    Ok(())
}

/// Rotate clockwise by `args` degrees, growing the canvas to fit
///
/// Right angles are exact; other angles are resampled bilinearly with the
/// uncovered corners left transparent.
pub fn rotate(image: &mut ImageHandle, args: &str) -> Result<(), DimsError> {
    let degrees: f64 = args
        .trim()
        .parse()
        .map_err(|e: std::num::ParseFloatError| DimsError::operation("rotate", args, e.to_string()))?;

    let normalized = degrees.rem_euclid(360.0);
    let rotated = match normalized {
        d if d == 0.0 => return Ok(()),
        d if d == 90.0 => image.image().rotate90(),
        d if d == 180.0 => image.image().rotate180(),
        d if d == 270.0 => image.image().rotate270(),
        d => DynamicImage::ImageRgba8(rotate_free(&image.image().to_rgba8(), d)),
    };
    image.set_image(rotated);
    Ok(())
}

fn rotate_free(source: &RgbaImage, degrees: f64) -> RgbaImage {
    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let (w, h) = (source.width() as f64, source.height() as f64);

    let out_w = (w * cos.abs() + h * sin.abs()).round().max(1.0) as u32;
    let out_h = (w * sin.abs() + h * cos.abs()).round().max(1.0) as u32;

    let (cx, cy) = (w / 2.0, h / 2.0);
    let (ocx, ocy) = (out_w as f64 / 2.0, out_h as f64 / 2.0);

    RgbaImage::from_fn(out_w, out_h, |x, y| {
        // Inverse map the output pixel centre into the source.
        let dx = x as f64 + 0.5 - ocx;
        let dy = y as f64 + 0.5 - ocy;
        let sx = dx * cos + dy * sin + cx - 0.5;
        let sy = -dx * sin + dy * cos + cy - 0.5;
        sample_bilinear(source, sx, sy)
    })
}

fn sample_bilinear(source: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (w, h) = (source.width() as i64, source.height() as i64);
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let fetch = |px: i64, py: i64| -> [f64; 4] {
        if px < 0 || py < 0 || px >= w || py >= h {
            [0.0; 4]
        } else {
            let p = source.get_pixel(px as u32, py as u32);
            let alpha = p[3] as f64;
            // premultiplied so transparent neighbours do not darken edges
            [
                p[0] as f64 * alpha,
                p[1] as f64 * alpha,
                p[2] as f64 * alpha,
                alpha,
            ]
        }
    };

    let corners = [
        (fetch(x0, y0), (1.0 - fx) * (1.0 - fy)),
        (fetch(x0 + 1, y0), fx * (1.0 - fy)),
        (fetch(x0, y0 + 1), (1.0 - fx) * fy),
        (fetch(x0 + 1, y0 + 1), fx * fy),
    ];

    let mut acc = [0.0f64; 4];
    for (value, weight) in corners {
        for c in 0..4 {
            acc[c] += value[c] * weight;
        }
    }

    let alpha = acc[3];
    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |v: f64| (v / alpha).round().clamp(0.0, 255.0) as u8;
    Rgba([
        channel(acc[0]),
        channel(acc[1]),
        channel(acc[2]),
        alpha.round().clamp(0.0, 255.0) as u8,
    ])
}
