//! Prometheus metrics
//!
//! [`init_metrics`] installs the exporter; the metric sets below register
//! their handles against whatever recorder is installed at creation time.

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Start the Prometheus exporter, serving `/metrics` on the given port
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new().with_http_listener(addr).install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Subscriber-facing server metrics
///
/// * `server_active_connections{server}` - currently open connections
/// * `server_connections_total{server}` - connections accepted since start
/// * `server_messages_sent_total{server}` - snapshot frames pushed
/// * `server_send_failures_total{server}` - pushes that ended a connection
#[derive(Clone)]
pub struct ServerMetrics {
    active_connections: Gauge,
    connections_total: Counter,
    messages_sent: Counter,
    send_failures: Counter,
}

impl ServerMetrics {
    /// Create metrics for a specific server (e.g. "websocket", "publisher")
    pub fn new(server_name: &str) -> Self {
        let name = server_name.to_string();

        Self {
            active_connections: gauge!("server_active_connections", "server" => name.clone()),
            connections_total: counter!("server_connections_total", "server" => name.clone()),
            messages_sent: counter!("server_messages_sent_total", "server" => name.clone()),
            send_failures: counter!("server_send_failures_total", "server" => name),
        }
    }

    pub fn connection_opened(&self) {
        self.connections_total.increment(1);
        self.active_connections.increment(1.0);
    }

    pub fn connection_closed(&self) {
        self.active_connections.decrement(1.0);
    }

    pub fn message_sent(&self) {
        self.messages_sent.increment(1);
    }

    pub fn send_failed(&self) {
        self.send_failures.increment(1);
    }
}

/// Poll loop metrics
///
/// * `greeks_poll_cycles_total` - completed cycles
/// * `greeks_symbols_stored_total` - entries written to the store
/// * `greeks_symbols_skipped_total{reason}` - symbols dropped from a cycle
/// * `greeks_poll_cycle_duration_seconds` - wall time per cycle
#[derive(Clone)]
pub struct PollerMetrics {
    cycles: Counter,
    stored: Counter,
    cycle_duration: Histogram,
}

impl PollerMetrics {
    pub fn new() -> Self {
        Self {
            cycles: counter!("greeks_poll_cycles_total"),
            stored: counter!("greeks_symbols_stored_total"),
            cycle_duration: histogram!("greeks_poll_cycle_duration_seconds"),
        }
    }

    pub fn record_cycle(&self, duration: Duration) {
        self.cycles.increment(1);
        self.cycle_duration.record(duration.as_secs_f64());
    }

    pub fn record_stored(&self) {
        self.stored.increment(1);
    }

    /// `reason` is a short stable label such as `price_unavailable`
    pub fn record_skipped(&self, reason: &'static str) {
        counter!("greeks_symbols_skipped_total", "reason" => reason).increment(1);
    }
}

impl Default for PollerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_without_recorder_are_noops() {
        let server = ServerMetrics::new("websocket");
        server.connection_opened();
        server.message_sent();
        server.connection_closed();

        let poller = PollerMetrics::new();
        poller.record_cycle(Duration::from_millis(12));
        poller.record_stored();
        poller.record_skipped("price_unavailable");
    }
}
