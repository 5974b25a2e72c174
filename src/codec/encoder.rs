//! Image encoder abstraction
//!
//! Provides a trait-based encoder system that allows:
//! - One encoder per output [`ImageType`]
//! - Codec tuning taken from [`ExportOptions`]
//! - EXIF re-embedding for JPEG when metadata is kept

use image::codecs::png::{CompressionType, FilterType as PngFilterType};
use image::{ColorType, DynamicImage, ImageEncoder as _};
use mozjpeg::qtable::{self, QTable};
use std::io::Cursor;
use std::panic::AssertUnwindSafe;

use super::{CodecError, ExportOptions, ImageHandle, ImageType, JpegParams, PngParams, WebpParams};
use crate::config::WebpCompression;

/// Result of encoding an image
#[derive(Debug)]
pub struct EncodedImage {
    /// The encoded image data
    pub data: Vec<u8>,
    /// The output format
    pub format: ImageType,
    /// Content-Type header value
    pub content_type: &'static str,
}

impl EncodedImage {
    pub fn new(data: Vec<u8>, format: ImageType) -> Self {
        Self {
            data,
            content_type: format.content_type(),
            format,
        }
    }
}

/// Trait for image encoders
///
/// The trait is object-safe so the factory can hand out boxed encoders.
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> ImageType;

    /// Encode `image` using the matching codec parameters from `options`
    fn encode(
        &self,
        image: &ImageHandle,
        options: &ExportOptions,
    ) -> Result<EncodedImage, CodecError>;

    /// Check if this encoder supports transparency
    fn supports_transparency(&self) -> bool;
}

/// JPEG encoder using mozjpeg
///
/// mozjpeg starts from its max-compression profile, where trellis
/// quantisation and overshoot deringing are both on. With both turned off
/// the encoder resets to the libjpeg-turbo profile instead.
pub struct JpegEncoder;

impl JpegEncoder {
    /// Base quantisation tables, indexed like mozjpeg's `quant_table` setting
    fn quant_tables(index: u8) -> Option<(&'static QTable, &'static QTable)> {
        let tables = match index {
            0 => (&qtable::AnnexK_Luma, &qtable::AnnexK_Chroma),
            1 => (&qtable::Flat, &qtable::Flat),
            2 => (&qtable::MSSSIM_Luma, &qtable::MSSSIM_Chroma),
            3 => (&qtable::NRobidoux, &qtable::NRobidoux),
            4 => (&qtable::PSNRHVS_Luma, &qtable::PSNRHVS_Chroma),
            5 => (&qtable::KleinSilversteinCarney, &qtable::KleinSilversteinCarney),
            6 => (&qtable::WatsonTaylorBorthwick, &qtable::WatsonTaylorBorthwick),
            7 => (&qtable::AhumadaWatsonPeterson, &qtable::AhumadaWatsonPeterson),
            8 => (&qtable::PetersonAhumadaWatson, &qtable::PetersonAhumadaWatson),
            _ => return None,
        };
        Some(tables)
    }

    fn compress(
        pixels: &[u8],
        width: u32,
        height: u32,
        color_space: mozjpeg::ColorSpace,
        params: &JpegParams,
    ) -> std::io::Result<Vec<u8>> {
        let quality = params.quality.clamp(1, 100) as f32;
        let mut comp = mozjpeg::Compress::new(color_space);

        if !params.trellis_quant && !params.overshoot_deringing {
            comp.set_fastest_defaults();
        }
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality);
        if let Some((luma, chroma)) = Self::quant_tables(params.quant_table) {
            comp.set_luma_qtable(&luma.scaled(quality, quality));
            comp.set_chroma_qtable(&chroma.scaled(quality, quality));
        }
        comp.set_optimize_coding(params.optimize_coding);

        // scan_info is cleared here, so this must run before progression is set
        comp.set_optimize_scans(params.optimize_scans);
        if params.interlace || params.optimize_scans {
            comp.set_progressive_mode();
        }

        if color_space == mozjpeg::ColorSpace::JCS_RGB {
            if params.subsample_mode {
                comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
            } else {
                comp.set_chroma_sampling_pixel_sizes((1, 1), (1, 1));
            }
        }

        let mut started = comp.start_compress(Vec::new())?;
        started.write_scanlines(pixels)?;
        started.finish()
    }
}

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> ImageType {
        ImageType::Jpeg
    }

    fn encode(
        &self,
        image: &ImageHandle,
        options: &ExportOptions,
    ) -> Result<EncodedImage, CodecError> {
        let params = &options.jpeg;
        let img = image.image();

        let (pixels, width, height, color_space) = match img {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageLumaA8(_) => {
                let gray = img.to_luma8();
                let (w, h) = gray.dimensions();
                (gray.into_raw(), w, h, mozjpeg::ColorSpace::JCS_GRAYSCALE)
            }
            _ => {
                let rgb = img.to_rgb8();
                let (w, h) = rgb.dimensions();
                (rgb.into_raw(), w, h, mozjpeg::ColorSpace::JCS_RGB)
            }
        };

        // libjpeg reports errors by unwinding
        let mut data = std::panic::catch_unwind(AssertUnwindSafe(|| {
            Self::compress(&pixels, width, height, color_space, params)
        }))
        .map_err(|_| CodecError::encode_failed("jpeg", "libjpeg error"))?
        .map_err(|e| CodecError::encode_failed("jpeg", e.to_string()))?;

        if !params.strip {
            if let Some(exif) = image.exif() {
                data = embed_exif(data, exif);
            }
        }

        Ok(EncodedImage::new(data, ImageType::Jpeg))
    }

    fn supports_transparency(&self) -> bool {
        false
    }
}

/// PNG encoder using the image crate, with oxipng for Adam7 interlacing
///
/// A quality below 100 posterises every colour channel before encoding,
/// leaving fewer distinct colours for oxipng's palette and bit-depth
/// reductions to work with.
pub struct PngEncoder;

impl PngEncoder {
    /// Snap colour channels to `levels` evenly spaced values; alpha is kept
    fn posterize(img: &DynamicImage, quality: u8) -> Option<DynamicImage> {
        if quality >= 100 {
            return None;
        }
        let levels = ((256 * quality.max(1) as u32) / 100).max(2) as f32;
        let step = 255.0 / (levels - 1.0);

        let mut rgba = img.to_rgba8();
        for pixel in rgba.pixels_mut() {
            for channel in pixel.0.iter_mut().take(3) {
                *channel = ((*channel as f32 / step).round() * step).round().min(255.0) as u8;
            }
        }
        Some(DynamicImage::ImageRgba8(rgba))
    }

    fn optimize(data: Vec<u8>, params: &PngParams) -> Result<Vec<u8>, CodecError> {
        if !params.interlace && params.quality >= 100 {
            return Ok(data);
        }
        let mut opts = oxipng::Options::from_preset(1);
        if params.interlace {
            opts.interlace = Some(oxipng::Interlacing::Adam7);
        }
        oxipng::optimize_from_memory(&data, &opts)
            .map_err(|e| CodecError::encode_failed("png", e.to_string()))
    }
}

impl ImageEncoder for PngEncoder {
    fn format(&self) -> ImageType {
        ImageType::Png
    }

    fn encode(
        &self,
        image: &ImageHandle,
        options: &ExportOptions,
    ) -> Result<EncodedImage, CodecError> {
        use image::codecs::png::PngEncoder as ImagePngEncoder;

        let params = &options.png;
        let compression = match params.compression {
            0..=2 => CompressionType::Fast,
            3..=6 => CompressionType::Default,
            _ => CompressionType::Best,
        };

        let posterized = Self::posterize(image.image(), params.quality);
        let img = posterized.as_ref().unwrap_or_else(|| image.image());

        let mut output = Cursor::new(Vec::new());
        let encoder =
            ImagePngEncoder::new_with_quality(&mut output, compression, PngFilterType::Adaptive);

        let result = match img.color() {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => {
                encoder.write_image(img.as_bytes(), img.width(), img.height(), img.color())
            }
            _ => {
                let rgba = img.to_rgba8();
                encoder.write_image(rgba.as_raw(), rgba.width(), rgba.height(), ColorType::Rgba8)
            }
        };
        result.map_err(|e| CodecError::encode_failed("png", e.to_string()))?;

        let data = Self::optimize(output.into_inner(), params)?;
        Ok(EncodedImage::new(data, ImageType::Png))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// WebP encoder using libwebp through the `webp` crate
///
/// `near_lossless` runs the lossless coder with libwebp's near-lossless
/// preprocessing at the configured quality. `reduction_effort` is libwebp's
/// `method` (0 fastest, 6 smallest).
pub struct WebPEncoder;

impl WebPEncoder {
    fn config(params: &WebpParams) -> Result<webp::WebPConfig, CodecError> {
        let mut config = webp::WebPConfig::new()
            .map_err(|_| CodecError::encode_failed("webp", "libwebp version mismatch"))?;

        config.quality = params.quality.clamp(1, 100) as f32;
        config.method = params.reduction_effort.min(6) as i32;
        match params.compression {
            WebpCompression::Lossy => {
                config.lossless = 0;
                config.alpha_compression = 1;
            }
            WebpCompression::NearLossless => {
                config.lossless = 1;
                config.alpha_compression = 0;
                config.near_lossless = params.quality.min(100) as i32;
            }
            WebpCompression::Lossless => {
                config.lossless = 1;
                config.alpha_compression = 0;
            }
        }
        Ok(config)
    }
}

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> ImageType {
        ImageType::Webp
    }

    fn encode(
        &self,
        image: &ImageHandle,
        options: &ExportOptions,
    ) -> Result<EncodedImage, CodecError> {
        let config = Self::config(&options.webp)?;
        let img = image.image();

        let rgba;
        let rgb;
        let encoder = if img.color().has_alpha() {
            rgba = img.to_rgba8();
            webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
        } else {
            rgb = img.to_rgb8();
            webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
        };

        let memory = encoder
            .encode_advanced(&config)
            .map_err(|e| CodecError::encode_failed("webp", format!("{:?}", e)))?;

        Ok(EncodedImage::new(memory.to_vec(), ImageType::Webp))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// GIF encoder (first frame only)
pub struct GifEncoder;

impl ImageEncoder for GifEncoder {
    fn format(&self) -> ImageType {
        ImageType::Gif
    }

    fn encode(
        &self,
        image: &ImageHandle,
        _options: &ExportOptions,
    ) -> Result<EncodedImage, CodecError> {
        use image::codecs::gif::GifEncoder as ImageGifEncoder;

        let rgba = image.image().to_rgba8();
        let mut data = Vec::new();
        {
            let mut encoder = ImageGifEncoder::new(&mut data);
            encoder
                .encode(rgba.as_raw(), rgba.width(), rgba.height(), ColorType::Rgba8)
                .map_err(|e| CodecError::encode_failed("gif", e.to_string()))?;
        }

        Ok(EncodedImage::new(data, ImageType::Gif))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// Uncompressed TIFF encoder
pub struct TiffEncoder;

impl ImageEncoder for TiffEncoder {
    fn format(&self) -> ImageType {
        ImageType::Tiff
    }

    fn encode(
        &self,
        image: &ImageHandle,
        _options: &ExportOptions,
    ) -> Result<EncodedImage, CodecError> {
        use image::codecs::tiff::TiffEncoder as ImageTiffEncoder;

        let rgba = image.image().to_rgba8();
        let mut output = Cursor::new(Vec::new());
        ImageTiffEncoder::new(&mut output)
            .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ColorType::Rgba8)
            .map_err(|e| CodecError::encode_failed("tiff", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), ImageType::Tiff))
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// Factory for creating encoders based on output format
pub struct EncoderFactory;

impl EncoderFactory {
    /// Create an encoder for the specified output format
    pub fn create(format: ImageType) -> Result<Box<dyn ImageEncoder>, CodecError> {
        match format {
            ImageType::Jpeg => Ok(Box::new(JpegEncoder)),
            ImageType::Png => Ok(Box::new(PngEncoder)),
            ImageType::Webp => Ok(Box::new(WebPEncoder)),
            ImageType::Gif => Ok(Box::new(GifEncoder)),
            ImageType::Tiff => Ok(Box::new(TiffEncoder)),
            ImageType::Svg => Err(CodecError::unsupported_format("svg")),
        }
    }

    /// Encode `image` to `options.image_type`
    pub fn encode(image: &ImageHandle, options: &ExportOptions) -> Result<EncodedImage, CodecError> {
        Self::create(options.image_type)?.encode(image, options)
    }
}

/// Insert an APP1 Exif segment directly after the JPEG SOI marker
fn embed_exif(jpeg: Vec<u8>, exif: &[u8]) -> Vec<u8> {
    const EXIF_HEADER: &[u8] = b"Exif\0\0";

    let segment_len = 2 + EXIF_HEADER.len() + exif.len();
    if segment_len > u16::MAX as usize || jpeg.len() < 2 || jpeg[..2] != [0xFF, 0xD8] {
        return jpeg;
    }

    let mut out = Vec::with_capacity(jpeg.len() + segment_len + 2);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&(segment_len as u16).to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(exif);
    out.extend_from_slice(&jpeg[2..]);
    out
}
