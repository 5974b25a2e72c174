//! S3 Object Lambda `GetObject` events.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::error::DimsError;
use crate::protocol::split_url;
use crate::request::DimsResponse;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetObjectContext {
    #[serde(default)]
    pub input_s3_url: String,
    pub output_route: String,
    pub output_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    /// The URL the client called, including the dims path and query
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3ObjectLambdaEvent {
    pub get_object_context: GetObjectContext,
    pub user_request: UserRequest,
}

/// Run the request core for the user request in `event`
pub async fn render(app: &App, event: &S3ObjectLambdaEvent) -> DimsResponse {
    let (_, path, query) = split_url(&event.user_request.url);
    tracing::debug!(path = %path, "S3 Object Lambda invocation");
    super::run(app, path, query).await
}

/// Handle one invocation and deliver the result through
/// `WriteGetObjectResponse`
pub async fn handle(
    app: &App,
    client: &S3Client,
    event: &S3ObjectLambdaEvent,
) -> Result<(), DimsError> {
    let response = render(app, event).await;
    let context = &event.get_object_context;

    let mut write = client
        .write_get_object_response()
        .request_route(&context.output_route)
        .request_token(&context.output_token)
        .status_code(i32::from(response.status))
        .content_length(response.body.len() as i64);

    if let Some(etag) = response.header("ETag") {
        write = write.e_tag(etag);
    }
    if let Some(content_type) = response.header("Content-Type") {
        write = write.content_type(content_type);
    }
    if let Some(cache_control) = response.header("Cache-Control") {
        write = write.cache_control(cache_control);
    }

    write
        .body(ByteStream::from(response.body.clone()))
        .send()
        .await
        .map_err(|e| {
            DimsError::internal(format!(
                "WriteGetObjectResponse failed: {}",
                aws_sdk_s3::error::DisplayErrorContext(&e)
            ))
        })?;

    tracing::info!(status = response.status, "Delivered S3 Object Lambda response");
    Ok(())
}
