//! AWS Lambda entry points.
//!
//! Two event shapes are supported:
//! - [`function_url`]: a Lambda function URL invocation; the transformed
//!   image is returned base64-encoded in the response
//! - [`s3_object`]: an S3 Object Lambda `GetObject` invocation; the image is
//!   delivered through `WriteGetObjectResponse`
//!
//! Both run the same request core as the HTTP server. Hosting the handlers
//! in a Lambda runtime is left to the deploying binary.

pub mod function_url;
pub mod s3_object;

use crate::app::App;
use crate::request::{self, DimsResponse};

/// Run the v4/v5 core for a path and query taken from an event
///
/// Paths outside both protocols get a 400 text response.
pub(crate) async fn run(app: &App, path: &str, raw_query: &str) -> DimsResponse {
    match request::dispatch(app, path, raw_query).await {
        Some(response) => response,
        None => {
            tracing::warn!(path = %path, "Lambda event path outside the dims protocols");
            DimsResponse::text(
                400,
                format!("path must start with /dims4/ or /v5/: {}", path),
            )
        }
    }
}
