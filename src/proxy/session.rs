//! Writing [`DimsResponse`]s to a pingora session.

use async_trait::async_trait;
use pingora_http::ResponseHeader;
use pingora_proxy::Session;

use crate::error::DimsError;
use crate::request::{DimsResponse, Responder};

/// Converts a gateway error into a pingora error for the proxy phases
pub(crate) fn to_pingora(err: DimsError) -> Box<pingora_core::Error> {
    pingora_core::Error::explain(pingora_core::ErrorType::InternalError, err.to_string())
}

fn internal(err: Box<pingora_core::Error>) -> DimsError {
    DimsError::internal(err.to_string())
}

/// Build the pingora response header for `response`
pub fn build_header(response: &DimsResponse) -> Result<ResponseHeader, DimsError> {
    let mut header =
        ResponseHeader::build(response.status, Some(response.headers.len())).map_err(internal)?;
    for (name, value) in &response.headers {
        header
            .insert_header(name.clone(), value.as_str())
            .map_err(internal)?;
    }
    Ok(header)
}

/// Responder backed by a live pingora session
pub struct SessionResponder<'a> {
    session: &'a mut Session,
}

impl<'a> SessionResponder<'a> {
    pub fn new(session: &'a mut Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Responder for SessionResponder<'_> {
    async fn respond(&mut self, response: DimsResponse) -> Result<(), DimsError> {
        let header = build_header(&response)?;
        let head_only = self.session.req_header().method == http::Method::HEAD;

        self.session
            .write_response_header(Box::new(header), head_only)
            .await
            .map_err(internal)?;
        if !head_only {
            // a client that disconnects here loses the image; nothing is retried
            self.session
                .write_response_body(Some(response.body), true)
                .await
                .map_err(internal)?;
        }
        Ok(())
    }
}
