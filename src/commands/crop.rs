//! `crop/WxH+X+Y`

use crate::codec::ImageHandle;
use crate::error::DimsError;
use crate::geometry::Geometry;

/// Parse crop arguments; spaces stand in for `+` after URL decoding
pub(crate) fn parse_crop_geometry(args: &str) -> Result<Geometry, DimsError> {
    let normalized = format!("{}!", args.replace(' ', "+"));
    Geometry::parse(&normalized).map_err(|e| DimsError::operation("crop", args, e.to_string()))
}

/// Crop box clamped to the image, as `(x, y, width, height)`
pub(crate) fn crop_box(
    geometry: &Geometry,
    image_width: u32,
    image_height: u32,
    args: &str,
) -> Result<(u32, u32, u32, u32), DimsError> {
    let projected = geometry.project(image_width, image_height);

    let x = u32::try_from(projected.x.max(0)).unwrap_or(u32::MAX);
    let y = u32::try_from(projected.y.max(0)).unwrap_or(u32::MAX);

    if x >= image_width {
        return Err(DimsError::operation("crop", args, "width must be greater than 0"));
    }
    if y >= image_height {
        return Err(DimsError::operation("crop", args, "height must be greater than 0"));
    }

    // f64 to u32 saturates; the box is clamped to what is left of the image
    let width = (projected.width as u32).min(image_width - x);
    let height = (projected.height as u32).min(image_height - y);

    if width == 0 {
        return Err(DimsError::operation("crop", args, "width must be greater than 0"));
    }
    if height == 0 {
        return Err(DimsError::operation("crop", args, "height must be greater than 0"));
    }

    Ok((x, y, width, height))
}

pub fn crop(image: &mut ImageHandle, args: &str) -> Result<(), DimsError> {
    let geometry = parse_crop_geometry(args)?;
    let (x, y, width, height) = crop_box(&geometry, image.width(), image.height(), args)?;

    let cropped = image.image().crop_imm(x, y, width, height);
    image.set_image(cropped);
    Ok(())
}
