use crate::*;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("No option symbols configured")]
    NoSymbols,

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("Risk-free rate must be a finite number, got: {0}")]
    NonFiniteRate(f64),

    #[error("Unknown store type: {0}. Must be one of: memory, redis")]
    InvalidStoreType(String),

    #[error("{field}: invalid URL '{url}': {message}")]
    InvalidUrl {
        field: String,
        url: String,
        message: String,
    },

    #[error("Port {port} is used by both {first} and {second}")]
    DuplicatePort {
        port: u16,
        first: String,
        second: String,
    },

    #[error("Unknown log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }
}

pub fn validate_config(config: &GreeksConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_symbols(&config.symbols, &mut report);
    validate_store(&config.store, &mut report);
    validate_timing(&config.poller, &config.broadcast, &mut report);
    validate_server(&config.server, &mut report);
    validate_provider(&config.provider, &mut report);

    if !matches!(config.logging.format.to_lowercase().as_str(), "pretty" | "json" | "compact") {
        report.add_error(ValidationError::InvalidLogFormat(config.logging.format.clone()));
    }

    report
}

fn validate_symbols(symbols: &[String], report: &mut ValidationReport) {
    if symbols.is_empty() {
        report.add_error(ValidationError::NoSymbols);
        return;
    }

    let mut seen = HashSet::new();
    for symbol in symbols {
        if !seen.insert(symbol.as_str()) {
            report.add_warning("symbols", &format!("{} is listed more than once", symbol));
        }
    }
}

fn validate_store(store: &StoreConfig, report: &mut ValidationReport) {
    match store.store_type.to_lowercase().as_str() {
        "memory" | "inmemory" | "in_memory" => {}
        "redis" => {
            check_url("store.redis_url", &store.redis_url, report);
            if store.hash_key.is_empty() {
                report.add_warning("store.hash_key", "empty hash key, Redis will reject writes");
            }
        }
        _ => report.add_error(ValidationError::InvalidStoreType(store.store_type.clone())),
    }
}

fn validate_timing(
    poller: &PollerConfig,
    broadcast: &BroadcastConfig,
    report: &mut ValidationReport,
) {
    if poller.interval_seconds == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "poller.interval_seconds".to_string(),
        });
    }

    if broadcast.push_interval_ms == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "broadcast.push_interval_ms".to_string(),
        });
    }

    let rate = poller.risk_free_rate;
    if !rate.is_finite() {
        report.add_error(ValidationError::NonFiniteRate(rate));
    } else if !(0.0..=0.25).contains(&rate) {
        report.add_warning(
            "poller.risk_free_rate",
            &format!(
                "{} is outside the usual range [0, 0.25]; rates are decimals, not percent",
                rate
            ),
        );
    }

    if poller.interval_seconds > 0
        && broadcast.push_interval_ms >= poller.interval_seconds.saturating_mul(1000)
    {
        report.add_warning(
            "broadcast.push_interval_ms",
            "push interval is not shorter than the poll interval",
        );
    }
}

fn validate_server(server: &ServerSettings, report: &mut ValidationReport) {
    let mut ports = vec![("http_port", server.http_port), ("ws_port", server.ws_port)];
    if let Some(port) = server.metrics_port {
        ports.push(("metrics_port", port));
    }

    for (i, (first, a)) in ports.iter().enumerate() {
        for (second, b) in ports.iter().skip(i + 1) {
            if a == b && *a != 0 {
                report.add_error(ValidationError::DuplicatePort {
                    port: *a,
                    first: first.to_string(),
                    second: second.to_string(),
                });
            }
        }
    }
}

fn validate_provider(provider: &ProviderConfig, report: &mut ValidationReport) {
    check_url("provider.quote_url", &provider.quote_url, report);
    check_url("provider.chart_url", &provider.chart_url, report);
    check_url("provider.options_url", &provider.options_url, report);

    if provider.timeout_seconds == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "provider.timeout_seconds".to_string(),
        });
    }
}

fn check_url(field: &str, raw: &str, report: &mut ValidationReport) {
    if let Err(e) = Url::parse(raw) {
        report.add_error(ValidationError::InvalidUrl {
            field: field.to_string(),
            url: raw.to_string(),
            message: e.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let report = validate_config(&GreeksConfig::default());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_empty_symbols_rejected() {
        let mut config = GreeksConfig::default();
        config.symbols.clear();

        let report = validate_config(&config);
        assert_eq!(report.errors, vec![ValidationError::NoSymbols]);
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let mut config = GreeksConfig::default();
        config.poller.interval_seconds = 0;
        config.broadcast.push_interval_ms = 0;

        let report = validate_config(&config);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_rate_checks() {
        let mut config = GreeksConfig::default();
        config.poller.risk_free_rate = f64::NAN;
        assert!(!validate_config(&config).is_valid());

        config.poller.risk_free_rate = 5.0;
        let report = validate_config(&config);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].field, "poller.risk_free_rate");
    }

    #[test]
    fn test_bad_redis_url_only_matters_for_redis() {
        let mut config = GreeksConfig::default();
        config.store.redis_url = "not a url".to_string();
        assert!(!validate_config(&config).is_valid());

        config.store.store_type = "memory".to_string();
        assert!(validate_config(&config).is_valid());
    }

    #[test]
    fn test_duplicate_ports() {
        let mut config = GreeksConfig::default();
        config.server.metrics_port = Some(config.server.ws_port);

        let report = validate_config(&config);
        assert!(matches!(
            report.errors.as_slice(),
            [ValidationError::DuplicatePort { port: 7087, .. }]
        ));
    }

    #[test]
    fn test_duplicate_symbol_warns() {
        let mut config = GreeksConfig::default();
        config.symbols.push(config.symbols[0].clone());

        let report = validate_config(&config);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_slow_push_warns() {
        let mut config = GreeksConfig::default();
        config.broadcast.push_interval_ms = 60_000;

        let report = validate_config(&config);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].field, "broadcast.push_interval_ms");
    }
}
