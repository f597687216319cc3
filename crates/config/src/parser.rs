use crate::*;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, instrument};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GreeksConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());

    let substituted = substitution::substitute_env_vars(&content);

    let config: GreeksConfig = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;

    info!(symbols = config.symbols.len(), "Configuration loaded successfully");
    Ok(config)
}

/// Load configuration from the process environment.
///
/// A `.env` file in the working directory is applied first when present;
/// variables already set in the environment take precedence over it.
pub fn load_from_env() -> Result<GreeksConfig> {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment overrides from {:?}", path),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).context("Failed to read .env file"),
    }

    from_lookup(|key| env::var(key).ok())
}

/// Build configuration from an arbitrary key lookup, starting from defaults.
pub fn from_lookup<F>(lookup: F) -> Result<GreeksConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = GreeksConfig::default();

    if let Some(v) = lookup("REDIS_URL") {
        config.store.redis_url = v;
    }
    if let Some(v) = lookup("STORE_TYPE") {
        config.store.store_type = v;
    }
    if let Some(v) = lookup("OPTION_SYMBOLS") {
        config.symbols = parse_symbols(&v);
    }
    if let Some(v) = parse_var(&lookup, "POLL_SEC")? {
        config.poller.interval_seconds = v;
    }
    if let Some(v) = parse_var(&lookup, "RISK_FREE")? {
        config.poller.risk_free_rate = v;
    }
    if let Some(v) = parse_var(&lookup, "PUSH_INTERVAL_MS")? {
        config.broadcast.push_interval_ms = v;
    }
    config.broadcast.publish_channel = lookup("PUBLISH_CHANNEL").filter(|c| !c.trim().is_empty());

    if let Some(v) = lookup("HOST") {
        config.server.host = v;
    }
    if let Some(v) = parse_var(&lookup, "HTTP_PORT")? {
        config.server.http_port = v;
    }
    if let Some(v) = parse_var(&lookup, "WS_PORT")? {
        config.server.ws_port = v;
    }
    config.server.metrics_port = parse_var(&lookup, "METRICS_PORT")?;

    if let Some(v) = lookup("QUOTE_URL") {
        config.provider.quote_url = v;
    }
    if let Some(v) = lookup("CHART_URL") {
        config.provider.chart_url = v;
    }
    if let Some(v) = lookup("OPTIONS_URL") {
        config.provider.options_url = v;
    }
    if let Some(v) = parse_var(&lookup, "PROVIDER_TIMEOUT_SECS")? {
        config.provider.timeout_seconds = v;
    }
    if let Some(v) = lookup("LOG_FORMAT") {
        config.logging.format = v;
    }

    Ok(config)
}

/// Split a comma-separated identifier list, dropping blank items
pub fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(None),
    }
}

#[instrument(skip(config))]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &GreeksConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    fs::write(path, yaml).with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = from_lookup(|_| None).unwrap();
        assert_eq!(config, GreeksConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = from_lookup(lookup_from(&[
            ("REDIS_URL", "redis://localhost:6380"),
            ("OPTION_SYMBOLS", " SPY241220C00500000 , ,QQQ241220P00400000,"),
            ("POLL_SEC", "15"),
            ("RISK_FREE", "0.043"),
            ("PUBLISH_CHANNEL", "greeks-updates"),
            ("METRICS_PORT", "9100"),
        ]))
        .unwrap();

        assert_eq!(config.store.redis_url, "redis://localhost:6380");
        assert_eq!(config.symbols, vec!["SPY241220C00500000", "QQQ241220P00400000"]);
        assert_eq!(config.poller.interval_seconds, 15);
        assert_eq!(config.poller.risk_free_rate, 0.043);
        assert_eq!(config.broadcast.publish_channel.as_deref(), Some("greeks-updates"));
        assert_eq!(config.server.metrics_port, Some(9100));
        assert_eq!(config.broadcast.push_interval_ms, 500);
    }

    #[test]
    fn test_blank_publish_channel_is_unset() {
        let config = from_lookup(lookup_from(&[("PUBLISH_CHANNEL", "  ")])).unwrap();
        assert!(config.broadcast.publish_channel.is_none());
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = from_lookup(lookup_from(&[("POLL_SEC", "thirty")])).unwrap_err();
        assert!(err.to_string().contains("POLL_SEC"));
    }

    #[test]
    fn test_parse_symbols() {
        assert_eq!(parse_symbols("A,B"), vec!["A", "B"]);
        assert!(parse_symbols("").is_empty());
        assert!(parse_symbols(" , ").is_empty());
    }

    #[test]
    fn test_load_config_round_trip() {
        let dir = std::env::temp_dir().join(format!("greeks-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("greeks.yaml");

        let mut config = GreeksConfig::default();
        config.symbols = vec!["SPY241220C00500000".to_string()];
        config.broadcast.publish_channel = Some("greeks".to_string());
        save_config(&config, &path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);

        fs::remove_dir_all(&dir).ok();
    }
}
