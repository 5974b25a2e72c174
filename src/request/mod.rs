//! The request core.
//!
//! A [`Request`] is built by a protocol adapter (`crate::protocol`) and then
//! driven through fetch, decode, pipeline and encode by [`handler`]. The
//! response layer ([`response`]) turns the outcome into headers and a body;
//! failures after verification go through the error image
//! ([`error_image`]).

use image::DynamicImage;
use std::sync::Arc;
use std::time::Duration;

use crate::codec::{self, EncodedImage, EncoderFactory, ExportOptions, ImageHandle, ImageType};
use crate::commands::{self, Command, Pipeline, RequestScope};
use crate::config::Config;
use crate::error::DimsError;
use crate::geometry::Geometry;
use crate::protocol::Protocol;
use crate::source::{BackendRegistry, SourceImage};
use crate::watermark::OverlayCache;

pub mod error_image;
pub mod handler;
pub mod query;
pub mod responder;
pub mod response;

pub use handler::{dispatch, handle, serve};
pub use query::QueryParams;
pub use responder::{BufferedResponder, Responder};
pub use response::DimsResponse;

/// Requested-size ratio above which JPEGs are decoded at reduced scale
const SHRINK_THRESHOLD: u32 = 2;

/// JPEG DCT scale denominator used for the fast path
const JPEG_SHRINK_FACTOR: u32 = 4;

/// One image request
#[derive(Debug, Clone)]
pub struct Request {
    /// Content-addressed digest of the request
    pub id: String,
    /// Request path, as received
    pub path: String,
    pub query: QueryParams,
    /// Source location after any `eurl` decryption
    pub image_url: String,
    /// `name/args/...` command text
    pub raw_commands: String,
    /// Signature claimed by the client
    pub signature: String,
    /// Values folded into the signature through `_keys`
    pub signed_params: Vec<String>,
    pub protocol: Protocol,
    pub source_image: SourceImage,
    /// 1, or 4 when the JPEG fast path decoded a smaller raster
    pub shrink_factor: u32,
    pub send_content_disposition: bool,
    /// Per-request copy of the process config
    pub config: Config,
}

/// Whether the response should carry `Content-Disposition`
///
/// `download=1` or `download=true` forces it on.
pub fn wants_disposition(config: &Config, query: &QueryParams) -> bool {
    config.options.include_disposition || matches!(query.value("download"), "1" | "true")
}

impl Request {
    pub fn commands(&self) -> Vec<Command> {
        commands::parse_commands(&self.raw_commands)
    }

    /// Source and overlay download timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout.download)
    }

    /// Check the claimed signature against the signing key
    pub fn verify_signature(&self) -> Result<(), DimsError> {
        if crate::protocol::verify(self) {
            Ok(())
        } else {
            Err(DimsError::unauthorized("invalid signature"))
        }
    }

    /// Download the source image through the backend registry
    pub async fn fetch_image(&mut self, registry: &BackendRegistry) -> Result<(), DimsError> {
        let source = registry.fetch(&self.image_url, self.timeout()).await?;
        if source.status != 200 {
            return Err(DimsError::status(
                source.status,
                format!("failed to fetch image from {}", self.image_url),
            ));
        }
        self.source_image = source;
        Ok(())
    }

    /// Download the watermark overlay ahead of the pipeline
    ///
    /// Returns `None` when no `watermark` command or no `overlay` parameter
    /// is present; the command reports the missing parameter itself.
    pub async fn fetch_overlay(
        &self,
        overlays: &OverlayCache,
        registry: &BackendRegistry,
    ) -> Result<Option<Arc<DynamicImage>>, DimsError> {
        let Some(command) = self.commands().into_iter().find(|c| c.name == "watermark") else {
            return Ok(None);
        };

        let overlay_url = self.query.value(commands::watermark::OVERLAY_PARAM);
        if overlay_url.is_empty() {
            return Ok(None);
        }

        match overlays.fetch(overlay_url, registry, self.timeout()).await {
            Ok(overlay) => Ok(Some(overlay)),
            Err(err @ DimsError::Timeout(_)) => Err(err),
            Err(err) => Err(DimsError::operation(
                "watermark",
                command.args,
                err.message().to_string(),
            )),
        }
    }

    /// First `thumbnail` or `resize` size with both axes in pixels
    pub fn requested_size(&self) -> Option<Geometry> {
        for command in self.commands() {
            if command.name != "thumbnail" && command.name != "resize" {
                continue;
            }
            let geometry = Geometry::parse(&command.args).ok()?;
            let pct = geometry.flags.width_pct || geometry.flags.height_pct;
            if geometry.has_both_axes() && !pct {
                return Some(geometry);
            }
        }
        None
    }

    /// Decode the fetched bytes, taking the JPEG shrink-on-load path when
    /// the requested size is much smaller than the source
    pub fn load_image(&mut self) -> Result<ImageHandle, DimsError> {
        self.shrink_factor = 1;
        let bytes = self.source_image.bytes.clone();

        let format = self
            .source_image
            .format
            .or_else(|| ImageType::detect(&bytes));
        if format == Some(ImageType::Jpeg) {
            if let Some(size) = self.requested_size() {
                let probe = codec::probe(&bytes)?;
                let (req_w, req_h) = (size.width as u32, size.height as u32);
                if req_w > 0
                    && req_h > 0
                    && (probe.width / req_w > SHRINK_THRESHOLD
                        || probe.height / req_h > SHRINK_THRESHOLD)
                {
                    self.shrink_factor = JPEG_SHRINK_FACTOR;
                }
            }
        }

        tracing::debug!(
            request_id = %self.id,
            shrink_factor = self.shrink_factor,
            "Decoding source image"
        );
        Ok(codec::decode(&bytes, self.shrink_factor)?)
    }

    /// Export options seeded from config, targeting the fallback output type
    pub fn export_options(&self, source: Option<ImageType>) -> ExportOptions {
        ExportOptions::from_config(&self.config, output_type(&self.config, source))
    }

    /// Run the command pipeline and encode the result
    ///
    /// With `lenient` set (error-image replay), command failures are
    /// ignored and request-scoped commands are skipped.
    pub fn process_image(
        &self,
        mut image: ImageHandle,
        source_format: Option<ImageType>,
        overlay: Option<&Arc<DynamicImage>>,
        lenient: bool,
    ) -> Result<EncodedImage, DimsError> {
        self.process_commands(&self.commands(), &mut image, source_format, overlay, lenient)
    }

    pub(crate) fn process_commands(
        &self,
        commands: &[Command],
        image: &mut ImageHandle,
        source_format: Option<ImageType>,
        overlay: Option<&Arc<DynamicImage>>,
        lenient: bool,
    ) -> Result<EncodedImage, DimsError> {
        let mut options = self.export_options(source_format);

        {
            let mut pipeline = Pipeline {
                image: &mut *image,
                options: &mut options,
                scope: RequestScope {
                    query: &self.query,
                    config: &self.config,
                    overlay,
                },
                lenient,
            };

            for command in commands {
                let mut command = command.clone();
                if command.name == "crop" && self.shrink_factor > 1 {
                    match adjust_crop_after_shrink(&command.args, self.shrink_factor) {
                        Ok(args) => command.args = args,
                        Err(err) if !lenient => return Err(err),
                        Err(_) => {}
                    }
                }
                pipeline.execute(&command)?;
            }
        }

        if options.strip() {
            image.remove_metadata();
        }

        tracing::debug!(
            request_id = %self.id,
            format = %options.image_type,
            "Encoding image"
        );
        Ok(EncoderFactory::encode(image, &options)?)
    }
}

/// Output type used when no `format` command runs
///
/// The configured default wins unless the source format is excluded; GIF
/// and SVG sources become PNG; anything else keeps its format.
pub fn output_type(config: &Config, source: Option<ImageType>) -> ImageType {
    if let Some(default) = config.output_format.default.as_deref() {
        let excluded = source.map_or(false, |source| {
            config.output_format.excluded.iter().any(|name| {
                name.eq_ignore_ascii_case(source.as_str())
                    || name.parse::<ImageType>().ok() == Some(source)
            })
        });
        if !excluded {
            if let Ok(image_type) = default.parse::<ImageType>() {
                return image_type;
            }
        }
    }

    match source {
        Some(ImageType::Gif) | Some(ImageType::Svg) => ImageType::Png,
        Some(image_type) => image_type,
        None => ImageType::Jpeg,
    }
}

/// Scale crop geometry down to a shrunk raster
///
/// Percentages are left alone; the output keeps only the components the
/// input specified.
pub fn adjust_crop_after_shrink(args: &str, factor: u32) -> Result<String, DimsError> {
    let normalized = args.replace(' ', "+");
    let mut geometry = Geometry::parse(&normalized)
        .map_err(|e| DimsError::operation("crop", args, e.to_string()))?;
    let factor_f = factor as f64;

    if !geometry.flags.x_pct {
        geometry.x = (geometry.x as f64 / factor_f) as i64;
    }
    if !geometry.flags.y_pct {
        geometry.y = (geometry.y as f64 / factor_f) as i64;
    }
    if geometry.width > 0.0 && !geometry.flags.width_pct {
        geometry.width = (geometry.width / factor_f).trunc();
    }
    if geometry.height > 0.0 && !geometry.flags.height_pct {
        geometry.height = (geometry.height / factor_f).trunc();
    }

    Ok(geometry.to_string())
}
