//! Export mutators: they edit [`ExportOptions`] and leave pixels alone.

use crate::codec::{ExportOptions, ImageHandle, ImageType};
use crate::error::DimsError;

/// `strip/true` drops metadata from the output; anything else keeps it
pub fn strip(
    image: &mut ImageHandle,
    args: &str,
    options: &mut ExportOptions,
) -> Result<(), DimsError> {
    let strip = args == "true";
    options.set_strip(strip);
    if strip {
        image.remove_metadata();
    }
    Ok(())
}

pub fn format(
    _image: &mut ImageHandle,
    args: &str,
    options: &mut ExportOptions,
) -> Result<(), DimsError> {
    let image_type: ImageType = args
        .parse()
        .map_err(|e: crate::codec::CodecError| DimsError::operation("format", args, e.to_string()))?;
    options.image_type = image_type;
    Ok(())
}

pub fn quality(
    _image: &mut ImageHandle,
    args: &str,
    options: &mut ExportOptions,
) -> Result<(), DimsError> {
    let quality: i64 = args
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| DimsError::operation("quality", args, e.to_string()))?;
    options.set_quality(quality.clamp(1, 100) as u8);
    Ok(())
}
