//! Lanczos-3 resampling using fast_image_resize

use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::DynamicImage;
use std::num::NonZeroU32;

use super::CodecError;

/// Resample `img` to exactly `target_w` x `target_h`
///
/// Alpha is premultiplied around the convolution so transparent edges do
/// not bleed colour.
pub fn resize_exact(
    img: &DynamicImage,
    target_w: u32,
    target_h: u32,
) -> Result<DynamicImage, CodecError> {
    let src_width =
        NonZeroU32::new(img.width()).ok_or_else(|| CodecError::resize_failed("Source width is 0"))?;
    let src_height = NonZeroU32::new(img.height())
        .ok_or_else(|| CodecError::resize_failed("Source height is 0"))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| CodecError::resize_failed("Target width is 0"))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| CodecError::resize_failed("Target height is 0"))?;

    let has_alpha = img.color().has_alpha();

    let mut src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| CodecError::resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let alpha_mul_div = MulDiv::default();
    if has_alpha {
        alpha_mul_div
            .multiply_alpha_inplace(&mut src_image.view_mut())
            .map_err(|e| CodecError::resize_failed(format!("{:?}", e)))?;
    }

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| CodecError::resize_failed(format!("Resize operation failed: {:?}", e)))?;

    if has_alpha {
        alpha_mul_div
            .divide_alpha_inplace(&mut dst_image.view_mut())
            .map_err(|e| CodecError::resize_failed(format!("{:?}", e)))?;
    }

    let rgba_image = image::RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| CodecError::resize_failed("Failed to create output image buffer"))?;

    let resized = DynamicImage::ImageRgba8(rgba_image);
    Ok(match img {
        DynamicImage::ImageLuma8(_) => DynamicImage::ImageLuma8(resized.to_luma8()),
        DynamicImage::ImageLumaA8(_) => DynamicImage::ImageLumaA8(resized.to_luma_alpha8()),
        DynamicImage::ImageRgb8(_) => DynamicImage::ImageRgb8(resized.to_rgb8()),
        _ => resized,
    })
}
