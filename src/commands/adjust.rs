//! Tonal adjustments: brightness, sepia, grayscale, autolevel and invert.
//!
//! All of them work on the colour bands only; alpha passes through.

use image::{DynamicImage, Rgba, RgbaImage};

use super::sharpen::restore_color;
use crate::codec::ImageHandle;
use crate::error::DimsError;

/// Map every colour band of `image` through `f`, keeping alpha and layout
fn map_bands(image: &DynamicImage, f: impl Fn(u8) -> u8) -> DynamicImage {
    let table: Vec<u8> = (0..=255u8).map(&f).collect();
    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        for c in 0..3 {
            pixel[c] = table[pixel[c] as usize];
        }
    }
    restore_color(image, DynamicImage::ImageRgba8(rgba))
}

/// Parse `B,C` or `BxC`; a missing contrast is 0
fn parse_brightness_args(args: &str) -> Option<(f64, f64)> {
    let mut parts = args.splitn(2, |c: char| c == ',' || c == 'x' || c == 'X');
    let brightness = parts.next()?.trim();
    let brightness: f64 = if brightness.is_empty() {
        0.0
    } else {
        brightness.parse().ok()?
    };
    let contrast: f64 = match parts.next().map(str::trim) {
        Some(c) if !c.is_empty() => c.parse().ok()?,
        _ => 0.0,
    };
    Some((brightness, contrast))
}

/// ImageMagick brightness/contrast as a linear `(slope, intercept)` pair
pub(crate) fn brightness_coefficients(brightness: f64, contrast: f64) -> (f64, f64) {
    let slope = if contrast < 0.0 {
        0.01 * contrast + 1.0
    } else {
        100.0 / (100.0 - contrast).max(f64::EPSILON)
    };
    let intercept = (0.01 * brightness - 0.5) * slope + 0.5;
    (slope, intercept)
}

pub fn brightness(image: &mut ImageHandle, args: &str) -> Result<(), DimsError> {
    let (b, c) = parse_brightness_args(args).ok_or_else(|| {
        DimsError::operation("brightness", args, "expected brightness,contrast")
    })?;
    let (slope, intercept) = brightness_coefficients(b, c);

    let adjusted = map_bands(image.image(), |v| {
        let normalized = v as f64 / 255.0;
        ((slope * normalized + intercept) * 255.0)
            .round()
            .clamp(0.0, 255.0) as u8
    });
    image.set_image(adjusted);
    Ok(())
}

/// Threshold as a fraction of the full range, from `0.8` or `80%`
fn parse_sepia_threshold(args: &str) -> Result<f64, DimsError> {
    let threshold = match args.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f64>().map(|v| v / 100.0),
        None => args.trim().parse::<f64>(),
    }
    .map_err(|e| DimsError::operation("sepia", args, e.to_string()))?;

    if !(0.0..=1.0).contains(&threshold) {
        return Err(DimsError::operation(
            "sepia",
            args,
            "threshold must be between 0 and 1",
        ));
    }
    Ok(threshold)
}

fn sepia_pixel(pixel: &Rgba<u8>, threshold: f64) -> Rgba<u8> {
    let intensity =
        0.212_656 * pixel[0] as f64 + 0.715_158 * pixel[1] as f64 + 0.072_186 * pixel[2] as f64;

    let red = if intensity > threshold {
        255.0
    } else {
        intensity + 255.0 - threshold
    };
    let mut green = if intensity > 7.0 * threshold / 6.0 {
        255.0
    } else {
        intensity + 255.0 - 7.0 * threshold / 6.0
    };
    let mut blue = if intensity < threshold / 6.0 {
        0.0
    } else {
        intensity - threshold / 6.0
    };

    let floor = threshold / 7.0;
    green = green.max(floor);
    blue = blue.max(floor);

    let clamp = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    Rgba([clamp(red), clamp(green), clamp(blue), pixel[3]])
}

pub fn sepia(image: &mut ImageHandle, args: &str) -> Result<(), DimsError> {
    let threshold = parse_sepia_threshold(args)? * 255.0;

    let source = image.image().to_rgba8();
    let toned = RgbaImage::from_fn(source.width(), source.height(), |x, y| {
        sepia_pixel(source.get_pixel(x, y), threshold)
    });

    let out = if image.has_alpha() {
        DynamicImage::ImageRgba8(toned)
    } else {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(toned).to_rgb8())
    };
    image.set_image(out);
    Ok(())
}

pub fn grayscale(image: &mut ImageHandle, args: &str) -> Result<(), DimsError> {
    if args != "true" {
        return Ok(());
    }
    let gray = if image.has_alpha() {
        DynamicImage::ImageLumaA8(image.image().to_luma_alpha8())
    } else {
        DynamicImage::ImageLuma8(image.image().to_luma8())
    };
    image.set_image(gray);
    Ok(())
}

/// Stretch the colour range so the darkest band value maps to 0 and the
/// brightest to 255
pub fn autolevel(image: &mut ImageHandle, args: &str) -> Result<(), DimsError> {
    if args != "true" {
        return Ok(());
    }

    let rgba = image.image().to_rgba8();
    let (mut min, mut max) = (u8::MAX, u8::MIN);
    for pixel in rgba.pixels() {
        for &v in &pixel.0[..3] {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if max <= min {
        return Ok(());
    }

    let scale = 255.0 / (max - min) as f64;
    let leveled = map_bands(image.image(), |v| {
        ((v.saturating_sub(min)) as f64 * scale).round().clamp(0.0, 255.0) as u8
    });
    image.set_image(leveled);
    Ok(())
}

pub fn invert(image: &mut ImageHandle, _args: &str) -> Result<(), DimsError> {
    let mut inverted = image.image().clone();
    inverted.invert();
    image.set_image(inverted);
    Ok(())
}
