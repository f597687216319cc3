//! Listener configuration

use crate::error::{Result, ServerError};
use config::ServerSettings;
use std::net::SocketAddr;

/// Bind settings for the subscriber-facing listeners.
///
/// A `None` port disables that listener; port `0` binds an ephemeral port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: Option<u16>,
    pub websocket_port: Option<u16>,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, http_port: u16, websocket_port: u16) -> Self {
        Self {
            host: host.into(),
            http_port: Some(http_port),
            websocket_port: Some(websocket_port),
        }
    }

    /// Both listeners enabled, from loaded settings
    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self::new(settings.host.clone(), settings.http_port, settings.ws_port)
    }

    pub(crate) fn socket_addr(&self, port: Option<u16>, what: &str) -> Result<SocketAddr> {
        let port = port
            .ok_or_else(|| ServerError::ConfigError(format!("{} port not configured", what)))?;

        format!("{}:{}", self.host, port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, port)))
    }
}

#[cfg(test)]
impl ServerConfig {
    pub(crate) fn http_only(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            http_port: Some(port),
            websocket_port: None,
        }
    }

    pub(crate) fn websocket_only(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            http_port: None,
            websocket_port: Some(port),
        }
    }
}
