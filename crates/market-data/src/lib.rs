//! Market data and pricing for the Greeks service
//!
//! # Core Components
//!
//! - [`symbol`] - contract identifier decoding
//! - [`black_scholes`] - Black-Scholes Greeks
//! - [`provider`] - underlying prices and option chains from upstream
//! - [`poller`] - the periodic decode, fetch, compute and store loop
//!
//! Everything here writes only through [`storage::GreeksStore`]; subscribers
//! never see this crate directly.

pub mod black_scholes;
pub mod error;
pub mod poller;
pub mod provider;
pub mod symbol;

pub use black_scholes::{black_scholes_greeks, BSInputs};
pub use error::MarketDataError;
pub use poller::{time_to_expiry, CycleReport, GreeksPoller};
pub use provider::{
    ContractQuote, MarketDataClient, MarketDataSource, OptionChain, QuoteProvider, YahooProvider,
};
pub use symbol::ContractId;

pub type Result<T> = std::result::Result<T, MarketDataError>;
