//! Snapshot serialization and push cadence shared by every subscriber path

use std::time::Duration;
use storage::GreeksStore;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::error::Result;

/// Read the whole cache and encode it as the subscriber JSON object.
///
/// Keys are ordered, so identical cache contents give identical payloads.
/// Non-finite values encode as `null`.
pub async fn snapshot_payload(store: &dyn GreeksStore) -> Result<String> {
    let snapshot = store.snapshot().await?;
    Ok(serde_json::to_string(&snapshot)?)
}

/// Ticker for periodic pushes.
///
/// The first tick completes immediately. A slow push delays later ticks
/// rather than bunching them up.
pub fn push_ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Greeks;
    use storage::InMemoryStore;

    #[tokio::test]
    async fn test_empty_snapshot_payload() {
        let store = InMemoryStore::new();
        assert_eq!(snapshot_payload(&store).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_payload_shape() {
        let store = InMemoryStore::new();
        let greeks = Greeks {
            delta: 0.5,
            gamma: 0.25,
            theta: -0.125,
            vega: 0.0625,
            rho: 2.0,
        };
        store.put("MSFT240920P00300000", &greeks).await.unwrap();
        store.put("AAPL240920C00175000", &greeks).await.unwrap();

        let payload = snapshot_payload(&store).await.unwrap();

        assert_eq!(
            payload,
            concat!(
                r#"{"AAPL240920C00175000":{"delta":0.5,"gamma":0.25,"theta":-0.125,"vega":0.0625,"rho":2.0},"#,
                r#""MSFT240920P00300000":{"delta":0.5,"gamma":0.25,"theta":-0.125,"vega":0.0625,"rho":2.0}}"#
            )
        );
    }

    #[tokio::test]
    async fn test_non_finite_encodes_as_null() {
        let store = InMemoryStore::new();
        let greeks = Greeks {
            delta: f64::NAN,
            ..Greeks::zero()
        };
        store.put("AAPL240920C00175000", &greeks).await.unwrap();

        let payload = snapshot_payload(&store).await.unwrap();
        assert!(payload.contains(r#""delta":null"#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_ticker_first_tick_is_immediate() {
        let mut ticker = push_ticker(Duration::from_millis(500));
        let start = tokio::time::Instant::now();

        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }
}
