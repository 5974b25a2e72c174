//! Decoding with auto-orientation and JPEG shrink-on-load

use image::codecs::jpeg::JpegDecoder;
use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageDecoder};
use std::io::Cursor;

use super::{CodecError, ImageHandle, ImageType};

/// Header-level facts about an encoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub format: ImageType,
    /// Width after EXIF orientation is applied
    pub width: u32,
    /// Height after EXIF orientation is applied
    pub height: u32,
}

/// Inspect format and dimensions without decoding pixels
pub fn probe(data: &[u8]) -> Result<Probe, CodecError> {
    let format = ImageType::detect(data)
        .ok_or_else(|| CodecError::decode_failed("unrecognised image data"))?;

    let image_format = format
        .image_format()
        .ok_or_else(|| CodecError::unsupported_format(format.as_str()))?;

    let (width, height) = ImageReader::with_format(Cursor::new(data), image_format)
        .into_dimensions()
        .map_err(|e| CodecError::decode_failed(e.to_string()))?;

    let (width, height) = match read_orientation(data) {
        5..=8 => (height, width),
        _ => (width, height),
    };

    Ok(Probe {
        format,
        width,
        height,
    })
}

/// Decode `data` into an image handle
///
/// `shrink` of 4 asks the JPEG decoder for a quarter-scale DCT decode; any
/// other value, or a non-JPEG source, decodes at full size. The raster is
/// rotated upright from its EXIF orientation. EXIF is kept on the handle
/// only when no rotation was needed, so re-embedding it cannot rotate the
/// output twice.
pub fn decode(data: &[u8], shrink: u32) -> Result<ImageHandle, CodecError> {
    let format = ImageType::detect(data)
        .ok_or_else(|| CodecError::decode_failed("unrecognised image data"))?;

    let image = match format {
        ImageType::Jpeg if shrink > 1 => decode_jpeg_scaled(data, shrink)?,
        ImageType::Svg => return Err(CodecError::unsupported_format("svg")),
        _ => decode_full(data)?,
    };

    let exif = read_exif(data);
    let orientation = exif.as_ref().map_or(1, orientation_of);

    let handle = if orientation == 1 {
        ImageHandle::new(image).with_exif(exif.map(|meta| meta.buf().to_vec()))
    } else {
        ImageHandle::new(apply_orientation(image, orientation))
    };

    Ok(handle)
}

fn decode_full(data: &[u8]) -> Result<DynamicImage, CodecError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| CodecError::decode_failed(e.to_string()))?
        .decode()
        .map_err(|e| CodecError::decode_failed(e.to_string()))
}

fn decode_jpeg_scaled(data: &[u8], shrink: u32) -> Result<DynamicImage, CodecError> {
    let mut decoder =
        JpegDecoder::new(Cursor::new(data)).map_err(|e| CodecError::decode_failed(e.to_string()))?;

    let (width, height) = decoder.dimensions();
    let target_w = ((width + shrink - 1) / shrink).clamp(1, u16::MAX as u32) as u16;
    let target_h = ((height + shrink - 1) / shrink).clamp(1, u16::MAX as u32) as u16;
    decoder
        .scale(target_w, target_h)
        .map_err(|e| CodecError::decode_failed(e.to_string()))?;

    DynamicImage::from_decoder(decoder).map_err(|e| CodecError::decode_failed(e.to_string()))
}

fn read_exif(data: &[u8]) -> Option<exif::Exif> {
    let mut cursor = Cursor::new(data);
    exif::Reader::new().read_from_container(&mut cursor).ok()
}

fn orientation_of(meta: &exif::Exif) -> u32 {
    meta.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

fn read_orientation(data: &[u8]) -> u32 {
    read_exif(data).as_ref().map_or(1, orientation_of)
}

/// Rotate/flip `img` upright for an EXIF orientation value
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}
