//! Lambda function URL events.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::app::App;
use crate::request::DimsResponse;

/// The parts of a function URL request the gateway reads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionUrlRequest {
    #[serde(default)]
    pub raw_path: String,
    #[serde(default)]
    pub raw_query_string: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionUrlResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    /// Base64 of the response body
    pub body: String,
    pub is_base64_encoded: bool,
}

impl From<DimsResponse> for FunctionUrlResponse {
    fn from(response: DimsResponse) -> Self {
        Self {
            status_code: response.status,
            headers: response.headers.into_iter().collect(),
            body: STANDARD.encode(&response.body),
            is_base64_encoded: true,
        }
    }
}

/// Handle one function URL invocation
pub async fn handle(app: &App, event: &FunctionUrlRequest) -> FunctionUrlResponse {
    tracing::debug!(
        path = %event.raw_path,
        query = %event.raw_query_string,
        "Function URL invocation"
    );
    super::run(app, &event.raw_path, &event.raw_query_string)
        .await
        .into()
}
