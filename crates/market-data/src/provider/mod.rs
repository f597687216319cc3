//! Market data acquisition
//!
//! [`QuoteProvider`] is the raw upstream seam (one implementation per data
//! vendor). [`MarketDataSource`] is what the poller consumes; the
//! [`MarketDataClient`] implements it on top of two providers, adding the
//! batch-then-per-symbol price fallback and chain row selection.

mod client;
mod yahoo;

pub use client::MarketDataClient;
pub use yahoo::YahooProvider;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::OptionType;
use std::collections::{BTreeSet, HashMap};

use crate::symbol::ContractId;
use crate::Result;

/// One row of an option chain
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRow {
    pub contract_symbol: String,
    /// Listed strike, when the vendor reports one
    pub strike: Option<f64>,
    pub implied_volatility: Option<f64>,
}

/// Calls and puts for a single (root, expiry)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionChain {
    pub calls: Vec<ChainRow>,
    pub puts: Vec<ChainRow>,
}

impl OptionChain {
    pub fn side(&self, option_type: OptionType) -> &[ChainRow] {
        match option_type {
            OptionType::Call => &self.calls,
            OptionType::Put => &self.puts,
        }
    }

    /// Row for `contract` on its own side of the chain.
    ///
    /// Upstream symbols are upper-case and strike-padded, so both the raw and
    /// canonical forms are compared without regard to case.
    pub fn find(&self, contract: &ContractId) -> Option<&ChainRow> {
        let canonical = contract.canonical();
        self.side(contract.option_type()).iter().find(|row| {
            row.contract_symbol.eq_ignore_ascii_case(contract.raw())
                || row.contract_symbol.eq_ignore_ascii_case(&canonical)
        })
    }
}

/// Per-contract data looked up from the chain.
///
/// Pricing always uses the strike encoded in the identifier; the listed
/// strike is kept only to flag chains that disagree with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContractQuote {
    pub implied_volatility: f64,
    pub listed_strike: Option<f64>,
}

/// Upstream market data vendor
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Vendor name for logs
    fn name(&self) -> &str;

    /// Last prices for many roots in one request.
    ///
    /// Roots the vendor has no price for are absent from the result.
    async fn batch_prices(&self, roots: &[String]) -> Result<HashMap<String, f64>>;

    /// Last price for a single root
    async fn price(&self, root: &str) -> Result<f64>;

    /// Option chain for one root and expiry
    async fn option_chain(&self, root: &str, expiry: NaiveDate) -> Result<OptionChain>;
}

/// Market data as seen by the poller
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Last price per root. A root with no price from any path is absent.
    async fn last_prices(&self, roots: &BTreeSet<String>) -> HashMap<String, f64>;

    /// Implied volatility (and listed strike) for one contract
    async fn contract_quote(&self, contract: &ContractId) -> Result<ContractQuote>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(symbol: &str, strike: f64) -> ChainRow {
        ChainRow {
            contract_symbol: symbol.to_string(),
            strike: Some(strike),
            implied_volatility: Some(0.3),
        }
    }

    #[test]
    fn test_find_uses_matching_side() {
        let chain = OptionChain {
            calls: vec![row("AAPL240920C00175000", 175.0)],
            puts: vec![row("AAPL240920P00175000", 175.0)],
        };

        let call = ContractId::decode("AAPL240920C00175000").unwrap();
        let put = ContractId::decode("AAPL240920P00175000").unwrap();
        let missing = ContractId::decode("AAPL240920C00180000").unwrap();

        assert_eq!(chain.find(&call).unwrap().contract_symbol, "AAPL240920C00175000");
        assert_eq!(chain.find(&put).unwrap().contract_symbol, "AAPL240920P00175000");
        assert!(chain.find(&missing).is_none());
    }

    #[test]
    fn test_find_accepts_unpadded_lowercase() {
        let chain = OptionChain {
            calls: vec![row("AAPL240920C00175000", 175.0)],
            puts: vec![],
        };

        let id = ContractId::decode("aapl240920C175000").unwrap();
        assert!(chain.find(&id).is_some());
    }
}
