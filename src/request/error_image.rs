//! The error image.
//!
//! Failures after signature verification are answered with a solid
//! `error.background` square instead of a bare status line, so clients that
//! embed the URL in an `<img>` tag still get something the requested size.

use image::{DynamicImage, Rgb, RgbImage};

use super::Request;
use crate::codec::{EncodedImage, EncoderFactory, ExportOptions, ImageHandle, ImageType};
use crate::commands::Command;
use crate::constants::ERROR_IMAGE_SIZE;
use crate::error::DimsError;

/// Quality used when the replayed error image cannot be encoded
const FALLBACK_JPEG_QUALITY: u8 = 1;

/// Parse `#RRGGBB`
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// A square canvas filled with `background`
pub fn background_image(background: &str) -> Result<ImageHandle, DimsError> {
    let [r, g, b] = parse_hex_color(background).ok_or_else(|| {
        DimsError::internal(format!("invalid error background '{}'", background))
    })?;
    let canvas = RgbImage::from_pixel(ERROR_IMAGE_SIZE, ERROR_IMAGE_SIZE, Rgb([r, g, b]));
    Ok(ImageHandle::new(DynamicImage::ImageRgb8(canvas)))
}

/// Commands replayed against the error image
///
/// Size-picking commands become `resize` so the placeholder matches the
/// dimensions the client asked for.
pub fn replay_commands(commands: &[Command]) -> Vec<Command> {
    commands
        .iter()
        .map(|command| match command.name.as_str() {
            "crop" | "thumbnail" | "legacy_thumbnail" => {
                Command::new("resize", command.args.clone())
            }
            _ => command.clone(),
        })
        .collect()
}

/// Render the error image for `request`
///
/// Replay failures are ignored; if the result cannot be encoded, the bare
/// background is returned as a minimum-quality JPEG.
pub fn render(request: &Request) -> Result<EncodedImage, DimsError> {
    let mut image = background_image(&request.config.error.background)?;
    let commands = replay_commands(&request.commands());

    match request.process_commands(&commands, &mut image, Some(ImageType::Jpeg), None, true) {
        Ok(encoded) => Ok(encoded),
        Err(err) => {
            tracing::debug!(
                request_id = %request.id,
                error = %err,
                "Error image replay failed, falling back to plain JPEG"
            );
            fallback_jpeg(request)
        }
    }
}

/// The untransformed background at minimum JPEG quality
pub(crate) fn fallback_jpeg(request: &Request) -> Result<EncodedImage, DimsError> {
    let background = background_image(&request.config.error.background)?;
    let mut options = ExportOptions::from_config(&request.config, ImageType::Jpeg);
    options.set_quality(FALLBACK_JPEG_QUALITY);
    Ok(EncoderFactory::encode(&background, &options)?)
}
