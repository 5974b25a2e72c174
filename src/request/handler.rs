//! Request orchestration: verify, fetch, transform, respond.
//!
//! Decode, pipeline and encode are CPU-bound and run on the blocking pool;
//! only the source and overlay downloads are awaited on the I/O runtime.

use std::borrow::Cow;
use std::time::Instant;

use super::response::{error_image_response, image_response};
use super::{error_image, DimsResponse, QueryParams, Request, Responder};
use crate::app::App;
use crate::error::DimsError;
use crate::protocol;

/// Paths answered with `200 ALIVE`
pub const STATUS_PATHS: [&str; 3] = ["/dims-status", "/dims-status/", "/healthz"];

/// The liveness response, when `path` is a status endpoint
pub fn status_response(path: &str) -> Option<DimsResponse> {
    STATUS_PATHS
        .contains(&path)
        .then(|| DimsResponse::text(200, "ALIVE"))
}

/// Run `request` to completion
///
/// Every failure after the request was parsed is answered with the error
/// image, carrying the status of the originating error.
pub async fn handle(app: &App, request: Request) -> DimsResponse {
    let started = Instant::now();
    let request_id = request.id.clone();

    let response = match process(app, request).await {
        Ok(response) => response,
        Err((request, err)) => render_error(request, err).await,
    };

    tracing::info!(
        request_id = %request_id,
        status = response.status,
        bytes = response.body.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "Request completed"
    );
    response
}

async fn process(app: &App, mut request: Request) -> Result<DimsResponse, (Request, DimsError)> {
    if let Err(err) = request.verify_signature() {
        if !request.config.development_mode {
            return Err((request, err));
        }
        tracing::warn!(
            request_id = %request.id,
            "Signature verification failed, bypassed in development mode"
        );
    }

    if let Err(err) = request.fetch_image(&app.registry).await {
        return Err((request, err));
    }

    let overlay = match request.fetch_overlay(&app.overlays, &app.registry).await {
        Ok(overlay) => overlay,
        Err(err) => return Err((request, err)),
    };

    let joined = tokio::task::spawn_blocking(move || {
        let result = request.load_image().and_then(|image| {
            let source_format = request.source_image.format;
            request.process_image(image, source_format, overlay.as_ref(), false)
        });
        (request, result)
    })
    .await;

    let (request, result) = match joined {
        Ok(pair) => pair,
        Err(join_err) => {
            tracing::error!(error = %join_err, "Image task failed");
            let err = DimsError::internal(join_err.to_string());
            return Ok(DimsResponse::text(err.status_code(), err.public_message()));
        }
    };

    match result {
        Ok(encoded) => Ok(image_response(&request, encoded)),
        Err(err) => Err((request, err)),
    }
}

async fn render_error(request: Request, err: DimsError) -> DimsResponse {
    let status = err.status_code();
    tracing::error!(
        request_id = %request.id,
        url = %request.image_url,
        status = status,
        kind = %err.kind(),
        error = %err.public_message(),
        "Request failed"
    );

    let rendered = tokio::task::spawn_blocking(move || {
        let encoded = error_image::render(&request);
        (request, encoded)
    })
    .await;

    match rendered {
        Ok((request, Ok(encoded))) => error_image_response(&request, status, encoded),
        Ok((_, Err(render_err))) => {
            tracing::error!(error = %render_err, "Failed to render error image");
            DimsResponse::text(status, err.public_message())
        }
        Err(join_err) => {
            tracing::error!(error = %join_err, "Error image task failed");
            DimsResponse::text(status, err.public_message())
        }
    }
}

/// Route a raw path and query to v4 or v5
///
/// Returns `None` when neither protocol serves `path`. Requests that fail to
/// parse are answered with a plain-text status.
pub async fn dispatch(app: &App, path: &str, raw_query: &str) -> Option<DimsResponse> {
    let path = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
    let query = QueryParams::parse(raw_query);

    let request = match protocol::parse_request(&app.config, &app.key, &path, query)? {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "Rejected malformed request");
            return Some(DimsResponse::text(err.status_code(), err.public_message()));
        }
    };

    tracing::debug!(
        request_id = %request.id,
        url = %request.image_url,
        commands = %request.raw_commands,
        "Dispatching request"
    );
    Some(handle(app, request).await)
}

/// Answer one HTTP request through `responder`; returns the status sent
///
/// Status paths get `ALIVE`, unknown paths `404`.
pub async fn serve<R>(
    app: &App,
    path: &str,
    raw_query: &str,
    responder: &mut R,
) -> Result<u16, DimsError>
where
    R: Responder + ?Sized,
{
    let response = match status_response(path) {
        Some(response) => response,
        None => dispatch(app, path, raw_query)
            .await
            .unwrap_or_else(|| DimsResponse::text(404, "Not Found")),
    };

    let status = response.status;
    responder.respond(response).await?;
    Ok(status)
}
