pub fn default_symbols() -> Vec<String> {
    vec![
        "AAPL240920C00175000".to_string(),
        "MSFT240920P00300000".to_string(),
    ]
}

pub fn default_store_type() -> String {
    "redis".to_string()
}

pub fn default_redis_url() -> String {
    "redis://redis:6379".to_string()
}

pub fn default_hash_key() -> String {
    "greeks".to_string()
}

pub fn default_poll_interval_secs() -> u64 {
    30
}

pub fn default_risk_free_rate() -> f64 {
    0.05
}

pub fn default_push_interval_ms() -> u64 {
    500
}

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_http_port() -> u16 {
    8087
}

pub fn default_ws_port() -> u16 {
    7087
}

pub fn default_quote_url() -> String {
    "https://query1.finance.yahoo.com/v7/finance/quote".to_string()
}

pub fn default_chart_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart".to_string()
}

pub fn default_options_url() -> String {
    "https://query1.finance.yahoo.com/v7/finance/options".to_string()
}

pub fn default_provider_timeout_secs() -> u64 {
    10
}

pub fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}
