//! Output seam between the request core and a transport.

use async_trait::async_trait;

use super::DimsResponse;
use crate::error::DimsError;

/// Writes a finished [`DimsResponse`] to whatever carries it back to the
/// client: a pingora session, a Lambda response, a test buffer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Responder: Send {
    async fn respond(&mut self, response: DimsResponse) -> Result<(), DimsError>;
}

/// Keeps the last response in memory
#[derive(Debug, Default)]
pub struct BufferedResponder {
    pub response: Option<DimsResponse>,
}

#[async_trait]
impl Responder for BufferedResponder {
    async fn respond(&mut self, response: DimsResponse) -> Result<(), DimsError> {
        self.response = Some(response);
        Ok(())
    }
}
