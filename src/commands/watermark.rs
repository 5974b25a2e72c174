//! `watermark/opacity,size,gravity` with the overlay named by `?overlay=`.

use super::RequestScope;
use crate::codec::ImageHandle;
use crate::error::DimsError;
use crate::watermark::{apply_watermark, WatermarkArgs};

/// Query parameter naming the overlay image
pub const OVERLAY_PARAM: &str = "overlay";

pub fn watermark(
    image: &mut ImageHandle,
    args: &str,
    scope: &RequestScope<'_>,
) -> Result<(), DimsError> {
    if scope.query.get(OVERLAY_PARAM).map_or(true, str::is_empty) {
        return Err(DimsError::operation(
            "watermark",
            args,
            format!("missing required query parameter '{}'", OVERLAY_PARAM),
        ));
    }

    let parsed: WatermarkArgs = args
        .parse()
        .map_err(|e: String| DimsError::operation("watermark", args, e))?;

    let overlay = scope
        .overlay
        .ok_or_else(|| DimsError::operation("watermark", args, "overlay image not loaded"))?;

    let composited = apply_watermark(image.image(), overlay, &parsed)
        .map_err(|e| DimsError::operation("watermark", args, e.to_string()))?;
    image.set_image(composited);
    Ok(())
}
