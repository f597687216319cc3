use async_trait::async_trait;
use config::ProviderConfig;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ContractQuote, MarketDataSource, QuoteProvider, YahooProvider};
use crate::error::MarketDataError;
use crate::symbol::ContractId;
use crate::Result;

/// Primary/secondary provider composition.
///
/// Prices come from one batched call to the primary. If that call fails or
/// comes back empty, each root is asked for individually on the secondary.
/// Chains always come from the primary. Nothing is retried.
pub struct MarketDataClient {
    primary: Arc<dyn QuoteProvider>,
    secondary: Arc<dyn QuoteProvider>,
}

impl MarketDataClient {
    pub fn new(primary: Arc<dyn QuoteProvider>, secondary: Arc<dyn QuoteProvider>) -> Self {
        Self { primary, secondary }
    }

    /// Yahoo quote endpoint first, Yahoo chart endpoint as the fallback
    pub fn yahoo(config: &ProviderConfig) -> Result<Self> {
        let yahoo: Arc<dyn QuoteProvider> = Arc::new(YahooProvider::new(config)?);
        Ok(Self::new(yahoo.clone(), yahoo))
    }

    async fn per_symbol_prices(&self, roots: &BTreeSet<String>) -> HashMap<String, f64> {
        let mut prices = HashMap::with_capacity(roots.len());

        for root in roots {
            match self.secondary.price(root).await {
                Ok(price) => {
                    prices.insert(root.clone(), price);
                }
                Err(e) => {
                    warn!(
                        root = %root,
                        provider = self.secondary.name(),
                        error = %e,
                        "Per-symbol price lookup failed"
                    );
                }
            }
        }

        prices
    }
}

#[async_trait]
impl MarketDataSource for MarketDataClient {
    async fn last_prices(&self, roots: &BTreeSet<String>) -> HashMap<String, f64> {
        if roots.is_empty() {
            return HashMap::new();
        }

        let requested: Vec<String> = roots.iter().cloned().collect();
        match self.primary.batch_prices(&requested).await {
            Ok(prices) if !prices.is_empty() => {
                debug!(priced = prices.len(), requested = roots.len(), "Batch prices fetched");
                return prices;
            }
            Ok(_) => {
                warn!(
                    provider = self.primary.name(),
                    "Batch quote returned no prices, falling back to per-symbol lookups"
                );
            }
            Err(e) => {
                warn!(
                    provider = self.primary.name(),
                    error = %e,
                    "Batch quote failed, falling back to per-symbol lookups"
                );
            }
        }

        self.per_symbol_prices(roots).await
    }

    async fn contract_quote(&self, contract: &ContractId) -> Result<ContractQuote> {
        let chain = self
            .primary
            .option_chain(contract.root(), contract.expiry())
            .await?;

        let row = chain
            .find(contract)
            .ok_or_else(|| MarketDataError::ContractNotFound(contract.raw().to_string()))?;

        let implied_volatility = row.implied_volatility.ok_or_else(|| {
            MarketDataError::ContractNotFound(format!(
                "{} has no implied volatility",
                contract.raw()
            ))
        })?;

        Ok(ContractQuote {
            implied_volatility,
            listed_strike: row.strike,
        })
    }
}
