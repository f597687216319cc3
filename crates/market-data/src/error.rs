//! Market data error types

use storage::StoreError;
use thiserror::Error;

/// Errors raised while turning a configured symbol into cached Greeks.
///
/// Every variant is contained at the poller's per-symbol boundary.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Identifier does not follow `<ROOT><YYMMDD><C|P><STRIKE*1000>`
    #[error("Malformed contract symbol: {0}")]
    MalformedSymbol(String),

    /// No underlying price from either the batch or per-symbol path
    #[error("No price available for underlying {0}")]
    PriceUnavailable(String),

    /// Chain has no matching row, or the row has no implied volatility
    #[error("Contract not found in option chain: {0}")]
    ContractNotFound(String),

    #[error("Provider transport error: {0}")]
    ProviderTransport(String),

    #[error("Provider response could not be decoded: {0}")]
    ProviderDecode(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl MarketDataError {
    /// Short stable label used for metrics and log fields
    pub fn reason(&self) -> &'static str {
        match self {
            MarketDataError::MalformedSymbol(_) => "malformed_symbol",
            MarketDataError::PriceUnavailable(_) => "price_unavailable",
            MarketDataError::ContractNotFound(_) => "contract_not_found",
            MarketDataError::ProviderTransport(_) => "provider_transport",
            MarketDataError::ProviderDecode(_) => "provider_decode",
            MarketDataError::Store(_) => "store",
        }
    }
}

impl From<reqwest::Error> for MarketDataError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            MarketDataError::ProviderDecode(e.to_string())
        } else {
            MarketDataError::ProviderTransport(e.to_string())
        }
    }
}
