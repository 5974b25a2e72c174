// Proxy module - Pingora ProxyHttp implementation
// Every route is answered in request_filter; nothing is proxied upstream.

use async_trait::async_trait;
use pingora_core::upstreams::peer::HttpPeer;
use pingora_core::Result;
use pingora_proxy::{ProxyHttp, Session};
use std::sync::Arc;
use std::time::Instant;

use crate::app::App;
use crate::request::{self, DimsResponse, Responder};

pub mod session;

pub use session::SessionResponder;

/// Per-request state carried between pingora phases
#[derive(Debug)]
pub struct RequestContext {
    request_id: String,
    started: Instant,
    status: Option<u16>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            started: Instant::now(),
            status: None,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// DimsProxy implements the Pingora ProxyHttp trait
/// Routes status, v4 and v5 requests to the image pipeline
pub struct DimsProxy {
    app: Arc<App>,
}

impl DimsProxy {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }

    pub fn app(&self) -> &Arc<App> {
        &self.app
    }
}

/// Whether the proxy serves `method` at all
fn method_allowed(method: &str) -> bool {
    matches!(method, "GET" | "HEAD")
}

#[async_trait]
impl ProxyHttp for DimsProxy {
    type CTX = RequestContext;

    fn new_ctx(&self) -> Self::CTX {
        RequestContext::new()
    }

    /// Never reached: request_filter answers every request
    async fn upstream_peer(
        &self,
        _session: &mut Session,
        ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        tracing::error!(request_id = %ctx.request_id(), "Unexpected upstream selection");
        Err(pingora_core::Error::explain(
            pingora_core::ErrorType::InternalError,
            "dims does not proxy upstream",
        ))
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        let req = session.req_header();
        let method = req.method.as_str().to_string();
        let path = req.uri.path().to_string();
        let query = req.uri.query().unwrap_or_default().to_string();

        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %method,
            path = %path,
            "Incoming request"
        );

        let mut responder = SessionResponder::new(session);

        if !method_allowed(&method) {
            let response = DimsResponse::text(405, "Method Not Allowed");
            ctx.status = Some(response.status);
            responder.respond(response).await.map_err(session::to_pingora)?;
            return Ok(true);
        }

        let status = request::serve(&self.app, &path, &query, &mut responder)
            .await
            .map_err(session::to_pingora)?;
        ctx.status = Some(status);

        Ok(true)
    }

    /// Access log line for every request
    async fn logging(
        &self,
        session: &mut Session,
        e: Option<&pingora_core::Error>,
        ctx: &mut Self::CTX,
    ) {
        let status = session
            .response_written()
            .map(|resp| resp.status.as_u16())
            .or(ctx.status)
            .unwrap_or(500);

        let req = session.req_header();
        tracing::info!(
            request_id = %ctx.request_id(),
            method = %req.method,
            path = %req.uri.path(),
            status = status,
            duration_ms = ctx.started.elapsed().as_millis() as u64,
            error = ?e.map(|e| e.to_string()),
            "HTTP request"
        );
    }
}
