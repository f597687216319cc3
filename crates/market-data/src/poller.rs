//! Periodic Greeks refresh
//!
//! Each cycle decodes the configured symbols, fetches underlying prices once
//! per distinct root, pulls each contract's strike and implied volatility,
//! computes Greeks and overwrites the cached entry. Per-symbol failures are
//! logged and skipped; they never end the cycle or the loop.

use chrono::{DateTime, Utc};
use config::PollerConfig;
use observability::PollerMetrics;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storage::GreeksStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::black_scholes::{black_scholes_greeks, BSInputs};
use crate::error::MarketDataError;
use crate::provider::MarketDataSource;
use crate::symbol::ContractId;

const SECONDS_PER_YEAR: f64 = 365.0 * 86_400.0;
const MIN_TIME_TO_EXPIRY: f64 = 1e-6;

/// Years from `now` until `expires_at`, floored at 1e-6
pub fn time_to_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let seconds = (expires_at - now).num_milliseconds() as f64 / 1000.0;
    (seconds / SECONDS_PER_YEAR).max(MIN_TIME_TO_EXPIRY)
}

/// Outcome counts for one poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub configured: usize,
    pub decoded: usize,
    pub stored: usize,
    pub skipped: usize,
}

/// Background task that keeps the Greeks cache fresh.
pub struct GreeksPoller {
    symbols: Vec<String>,
    source: Arc<dyn MarketDataSource>,
    store: Arc<dyn GreeksStore>,
    risk_free_rate: f64,
    interval: Duration,
    metrics: PollerMetrics,
}

impl GreeksPoller {
    pub fn new(
        symbols: Vec<String>,
        source: Arc<dyn MarketDataSource>,
        store: Arc<dyn GreeksStore>,
        config: &PollerConfig,
    ) -> Self {
        Self {
            symbols,
            source,
            store,
            risk_free_rate: config.risk_free_rate,
            interval: config.interval(),
            metrics: PollerMetrics::new(),
        }
    }

    /// Run cycles until `token` is cancelled.
    ///
    /// The first cycle starts immediately; each later one starts `interval`
    /// after the previous one finished.
    pub async fn run(&self, token: CancellationToken) {
        info!(
            symbols = self.symbols.len(),
            interval_secs = self.interval.as_secs(),
            rate = self.risk_free_rate,
            store = self.store.backend(),
            "Starting Greeks poller"
        );

        loop {
            self.run_cycle(&token).await;

            tokio::select! {
                _ = token.cancelled() => {
                    info!("Greeks poller shutting down");
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    pub async fn run_cycle(&self, token: &CancellationToken) -> CycleReport {
        self.run_cycle_at(Utc::now(), token).await
    }

    /// Run one cycle pricing against `now`.
    ///
    /// Stops early, without touching further entries, once `token` is
    /// cancelled.
    #[instrument(skip(self, token))]
    pub async fn run_cycle_at(&self, now: DateTime<Utc>, token: &CancellationToken) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport {
            configured: self.symbols.len(),
            ..CycleReport::default()
        };

        let contracts: Vec<ContractId> = self
            .symbols
            .iter()
            .filter_map(|raw| match ContractId::decode(raw) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(symbol = %raw, error = %e, "Skipping undecodable symbol");
                    self.metrics.record_skipped(e.reason());
                    None
                }
            })
            .collect();
        report.decoded = contracts.len();
        report.skipped = report.configured - report.decoded;

        let roots: BTreeSet<String> = contracts.iter().map(|c| c.root().to_string()).collect();
        let prices = if roots.is_empty() || token.is_cancelled() {
            Default::default()
        } else {
            self.source.last_prices(&roots).await
        };

        for contract in &contracts {
            if token.is_cancelled() {
                debug!("Cycle cancelled before all symbols were processed");
                break;
            }

            let result = match prices.get(contract.root()) {
                Some(&spot) => self.refresh(contract, spot, now).await,
                None => Err(MarketDataError::PriceUnavailable(contract.root().to_string())),
            };

            match result {
                Ok(()) => {
                    report.stored += 1;
                    self.metrics.record_stored();
                }
                Err(e) => {
                    warn!(
                        symbol = %contract.raw(),
                        reason = e.reason(),
                        error = %e,
                        "Skipping symbol this cycle"
                    );
                    self.metrics.record_skipped(e.reason());
                    report.skipped += 1;
                }
            }
        }

        self.metrics.record_cycle(started.elapsed());
        info!(
            at = %now.format("%H:%M:%S"),
            stored = report.stored,
            configured = report.configured,
            skipped = report.skipped,
            "Poll cycle complete"
        );

        report
    }

    async fn refresh(
        &self,
        contract: &ContractId,
        spot: f64,
        now: DateTime<Utc>,
    ) -> crate::Result<()> {
        let quote = self.source.contract_quote(contract).await?;

        let strike = contract.strike();
        if let Some(listed) = quote.listed_strike.filter(|listed| (listed - strike).abs() > 1e-9) {
            debug!(symbol = %contract.raw(), strike, listed, "Chain lists a different strike");
        }

        let greeks = black_scholes_greeks(BSInputs {
            spot,
            strike,
            time: time_to_expiry(contract.expires_at(), now),
            vol: quote.implied_volatility,
            rate: self.risk_free_rate,
            option_type: contract.option_type(),
        });

        if !greeks.is_finite() {
            warn!(symbol = %contract.raw(), ?greeks, "Computed non-finite Greeks");
        }

        self.store.put(contract.raw(), &greeks).await?;
        debug!(symbol = %contract.raw(), delta = greeks.delta, "Greeks updated");
        Ok(())
    }
}
