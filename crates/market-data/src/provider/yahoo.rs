//! Yahoo Finance provider
//!
//! Uses the unofficial public endpoints:
//!
//! - `v7/finance/quote?symbols=A,B` for batched last prices
//! - `v8/finance/chart/{root}` for a single last price
//! - `v7/finance/options/{root}?date={unix}` for an expiry's chain

use async_trait::async_trait;
use chrono::NaiveDate;
use config::ProviderConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use super::{ChainRow, OptionChain, QuoteProvider};
use crate::error::MarketDataError;
use crate::symbol::start_of_day_utc;
use crate::Result;

/// Yahoo Finance HTTP client
pub struct YahooProvider {
    client: Client,
    quote_url: String,
    chart_url: String,
    options_url: String,
}

impl YahooProvider {
    /// Build a provider; every request is bounded by the configured timeout
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| MarketDataError::ProviderTransport(e.to_string()))?;

        Ok(Self {
            client,
            quote_url: config.quote_url.trim_end_matches('/').to_string(),
            chart_url: config.chart_url.trim_end_matches('/').to_string(),
            options_url: config.options_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::ProviderTransport(format!(
                "{} returned {}",
                url, status
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| MarketDataError::ProviderDecode(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn batch_prices(&self, roots: &[String]) -> Result<HashMap<String, f64>> {
        if roots.is_empty() {
            return Ok(HashMap::new());
        }

        let envelope: QuoteEnvelope = self
            .get_json(&self.quote_url, &[("symbols", roots.join(","))])
            .await?;

        let prices = envelope.prices_for(roots);
        debug!(requested = roots.len(), priced = prices.len(), "Batch quote");
        Ok(prices)
    }

    async fn price(&self, root: &str) -> Result<f64> {
        let url = format!("{}/{}", self.chart_url, root);
        let envelope: ChartEnvelope = self
            .get_json(&url, &[("interval", "1d".to_string()), ("range", "1d".to_string())])
            .await?;

        envelope
            .last_price()
            .ok_or_else(|| MarketDataError::PriceUnavailable(root.to_string()))
    }

    async fn option_chain(&self, root: &str, expiry: NaiveDate) -> Result<OptionChain> {
        let url = format!("{}/{}", self.options_url, root);
        let date = start_of_day_utc(expiry).timestamp();

        let envelope: OptionsEnvelope = self.get_json(&url, &[("date", date.to_string())]).await?;
        Ok(envelope.into_chain())
    }
}

// ==================== Response payloads ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Option<Vec<QuoteResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResult {
    symbol: String,
    regular_market_price: Option<f64>,
}

impl QuoteEnvelope {
    /// Prices keyed by the requested spelling of each root
    fn prices_for(&self, roots: &[String]) -> HashMap<String, f64> {
        let results = self.quote_response.result.as_deref().unwrap_or_default();

        roots
            .iter()
            .filter_map(|root| {
                results
                    .iter()
                    .find(|r| r.symbol.eq_ignore_ascii_case(root))
                    .and_then(|r| r.regular_market_price)
                    .map(|price| (root.clone(), price))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
}

impl ChartEnvelope {
    fn last_price(&self) -> Option<f64> {
        let meta = &self.chart.result.as_ref()?.first()?.meta;
        meta.regular_market_price
            .or(meta.previous_close)
            .or(meta.chart_previous_close)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsEnvelope {
    option_chain: OptionsBody,
}

#[derive(Debug, Deserialize)]
struct OptionsBody {
    #[serde(default)]
    result: Option<Vec<OptionsResult>>,
}

#[derive(Debug, Deserialize)]
struct OptionsResult {
    #[serde(default)]
    options: Vec<OptionsBlock>,
}

#[derive(Debug, Deserialize)]
struct OptionsBlock {
    #[serde(default)]
    calls: Vec<RawContract>,
    #[serde(default)]
    puts: Vec<RawContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContract {
    contract_symbol: String,
    strike: Option<f64>,
    implied_volatility: Option<f64>,
}

impl From<RawContract> for ChainRow {
    fn from(raw: RawContract) -> Self {
        ChainRow {
            contract_symbol: raw.contract_symbol,
            strike: raw.strike,
            implied_volatility: raw.implied_volatility,
        }
    }
}

impl OptionsEnvelope {
    fn into_chain(self) -> OptionChain {
        let block = self
            .option_chain
            .result
            .and_then(|results| results.into_iter().next())
            .and_then(|result| result.options.into_iter().next());

        match block {
            Some(block) => OptionChain {
                calls: block.calls.into_iter().map(ChainRow::from).collect(),
                puts: block.puts.into_iter().map(ChainRow::from).collect(),
            },
            None => OptionChain::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE_FIXTURE: &str = r#"{
        "quoteResponse": {
            "result": [
                {"symbol": "AAPL", "regularMarketPrice": 228.2, "currency": "USD"},
                {"symbol": "MSFT", "regularMarketPrice": 415.1},
                {"symbol": "TSLA"}
            ],
            "error": null
        }
    }"#;

    const CHART_FIXTURE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL", "regularMarketPrice": 228.2, "previousClose": 226.0},
                "timestamp": [1726833600]
            }],
            "error": null
        }
    }"#;

    const OPTIONS_FIXTURE: &str = r#"{
        "optionChain": {
            "result": [{
                "underlyingSymbol": "AAPL",
                "expirationDates": [1726790400],
                "options": [{
                    "expirationDate": 1726790400,
                    "calls": [
                        {"contractSymbol": "AAPL240920C00175000", "strike": 175.0, "impliedVolatility": 0.41},
                        {"contractSymbol": "AAPL240920C00180000", "strike": 180.0}
                    ],
                    "puts": [
                        {"contractSymbol": "AAPL240920P00175000", "strike": 175.0, "impliedVolatility": 0.38},
                        {"contractSymbol": "AAPL240920P00180000", "impliedVolatility": 0.36}
                    ]
                }]
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_decode_batch_quote() {
        let envelope: QuoteEnvelope = serde_json::from_str(QUOTE_FIXTURE).unwrap();
        let roots: Vec<String> = ["AAPL", "msft", "TSLA", "NVDA"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let prices = envelope.prices_for(&roots);

        assert_eq!(prices.len(), 2);
        assert_eq!(prices["AAPL"], 228.2);
        assert_eq!(prices["msft"], 415.1);
    }

    #[test]
    fn test_decode_empty_batch_quote() {
        let envelope: QuoteEnvelope =
            serde_json::from_str(r#"{"quoteResponse": {"result": [], "error": null}}"#).unwrap();
        assert!(envelope.prices_for(&["AAPL".to_string()]).is_empty());

        let envelope: QuoteEnvelope =
            serde_json::from_str(r#"{"quoteResponse": {"result": null}}"#).unwrap();
        assert!(envelope.prices_for(&["AAPL".to_string()]).is_empty());
    }

    #[test]
    fn test_decode_chart() {
        let envelope: ChartEnvelope = serde_json::from_str(CHART_FIXTURE).unwrap();
        assert_eq!(envelope.last_price(), Some(228.2));
    }

    #[test]
    fn test_chart_falls_back_to_previous_close() {
        let envelope: ChartEnvelope = serde_json::from_str(
            r#"{"chart": {"result": [{"meta": {"previousClose": 226.0}}], "error": null}}"#,
        )
        .unwrap();
        assert_eq!(envelope.last_price(), Some(226.0));

        let envelope: ChartEnvelope = serde_json::from_str(
            r#"{"chart": {"result": null, "error": {"code": "Not Found"}}}"#,
        )
        .unwrap();
        assert_eq!(envelope.last_price(), None);
    }

    #[test]
    fn test_decode_option_chain() {
        let envelope: OptionsEnvelope = serde_json::from_str(OPTIONS_FIXTURE).unwrap();
        let chain = envelope.into_chain();

        assert_eq!(chain.calls.len(), 2);
        assert_eq!(chain.calls[0].implied_volatility, Some(0.41));
        assert_eq!(chain.calls[1].implied_volatility, None);
        assert_eq!(chain.puts.len(), 2);
        assert_eq!(chain.puts[0].strike, Some(175.0));
        // a row without a strike is still usable for its volatility
        assert_eq!(chain.puts[1].strike, None);
        assert_eq!(chain.puts[1].implied_volatility, Some(0.36));
    }

    #[test]
    fn test_decode_option_chain_without_results() {
        let envelope: OptionsEnvelope =
            serde_json::from_str(r#"{"optionChain": {"result": [], "error": null}}"#).unwrap();
        assert_eq!(envelope.into_chain(), OptionChain::default());
    }

    #[test]
    fn test_new_trims_base_urls() {
        let config = ProviderConfig {
            quote_url: "http://localhost:1/quote/".to_string(),
            ..ProviderConfig::default()
        };

        let provider = YahooProvider::new(&config).unwrap();
        assert_eq!(provider.quote_url, "http://localhost:1/quote");
        assert_eq!(provider.name(), "yahoo");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let config = ProviderConfig {
            quote_url: "http://127.0.0.1:9/quote".to_string(),
            timeout_seconds: 2,
            ..ProviderConfig::default()
        };
        let provider = YahooProvider::new(&config).unwrap();

        let err = provider.batch_prices(&["AAPL".to_string()]).await.unwrap_err();
        assert!(matches!(err, MarketDataError::ProviderTransport(_)));
    }
}
