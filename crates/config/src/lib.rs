//! Configuration for the Greeks streaming service
//!
//! Configuration is read once at startup, either from environment variables
//! (optionally seeded from a `.env` file) or from a YAML file with `${VAR}`
//! substitution. The resulting [`GreeksConfig`] is passed by value into the
//! components that need it; nothing here is global.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

/// Top-level service configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GreeksConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Raw contract identifiers to track
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for GreeksConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            symbols: default_symbols(),
            poller: PollerConfig::default(),
            broadcast: BroadcastConfig::default(),
            server: ServerSettings::default(),
            provider: ProviderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Cache backing store
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoreConfig {
    /// `memory` or `redis`
    #[serde(rename = "type")]
    #[serde(default = "default_store_type")]
    pub store_type: String,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Redis hash holding every entry
    #[serde(default = "default_hash_key")]
    pub hash_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: default_store_type(),
            redis_url: default_redis_url(),
            hash_key: default_hash_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PollerConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub interval_seconds: u64,
    /// Continuously-compounded risk-free rate as a decimal
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_poll_interval_secs(),
            risk_free_rate: default_risk_free_rate(),
        }
    }
}

/// Subscriber-facing push cadence and optional channel publishing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BroadcastConfig {
    #[serde(default = "default_push_interval_ms")]
    pub push_interval_ms: u64,
    /// Redis pub/sub channel to publish snapshots on, if any
    #[serde(default)]
    pub publish_channel: Option<String>,
}

impl BroadcastConfig {
    pub fn push_interval(&self) -> Duration {
        Duration::from_millis(self.push_interval_ms)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            push_interval_ms: default_push_interval_ms(),
            publish_channel: None,
        }
    }
}

/// Bind addresses for the HTTP, WebSocket and metrics listeners
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            ws_port: default_ws_port(),
            metrics_port: None,
        }
    }
}

/// Upstream market data endpoints
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Batched quote endpoint
    #[serde(default = "default_quote_url")]
    pub quote_url: String,
    /// Per-symbol chart endpoint used as the price fallback
    #[serde(default = "default_chart_url")]
    pub chart_url: String,
    /// Option chain endpoint
    #[serde(default = "default_options_url")]
    pub options_url: String,
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            quote_url: default_quote_url(),
            chart_url: default_chart_url(),
            options_url: default_options_url(),
            timeout_seconds: default_provider_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `pretty`, `json` or `compact`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GreeksConfig::default();

        assert_eq!(config.store.redis_url, "redis://redis:6379");
        assert_eq!(config.store.store_type, "redis");
        assert_eq!(
            config.symbols,
            vec!["AAPL240920C00175000", "MSFT240920P00300000"]
        );
        assert_eq!(config.poller.interval(), Duration::from_secs(30));
        assert_eq!(config.poller.risk_free_rate, 0.05);
        assert_eq!(config.broadcast.push_interval(), Duration::from_millis(500));
        assert!(config.broadcast.publish_channel.is_none());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
symbols:
  - SPY241220C00500000
poller:
  interval_seconds: 5
"#;
        let config: GreeksConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.symbols, vec!["SPY241220C00500000"]);
        assert_eq!(config.poller.interval_seconds, 5);
        assert_eq!(config.poller.risk_free_rate, 0.05);
        assert_eq!(config.server.ws_port, 7087);
    }
}
