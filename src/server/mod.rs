// Server module - Pingora HTTP server setup and configuration

use pingora::server::configuration::Opt as ServerOpt;
use pingora::server::Server;
use std::sync::Arc;

use crate::app::App;
use crate::config::Config;
use crate::error::DimsError;
use crate::proxy::DimsProxy;

/// Listener settings for the HTTP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address to bind to (e.g., "0.0.0.0:8080")
    pub address: String,
    /// Detach from the terminal after startup
    pub daemon: bool,
}

impl ServerConfig {
    pub fn new(address: String) -> Self {
        Self {
            address,
            daemon: false,
        }
    }

    /// Create ServerConfig from application Config
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.listen_address())
    }

    /// Pingora options for this listener
    pub fn server_opt(&self) -> ServerOpt {
        ServerOpt {
            daemon: self.daemon,
            ..Default::default()
        }
    }
}

/// Build a bootstrapped Pingora server with the dims service attached
///
/// The caller runs it with `run_forever`.
pub fn build(app: Arc<App>, config: &ServerConfig) -> Result<Server, DimsError> {
    let mut server = Server::new(Some(config.server_opt()))
        .map_err(|e| DimsError::internal(format!("Failed to create Pingora server: {}", e)))?;
    server.bootstrap();

    let proxy = DimsProxy::new(app);
    let mut service = pingora_proxy::http_proxy_service(&server.configuration, proxy);
    service.add_tcp(&config.address);
    server.add_service(service);

    tracing::info!(address = %config.address, daemon = config.daemon, "Starting dims server");
    Ok(server)
}
