//! Prometheus metrics for the tracker.
//!
//! All metrics are aggregated in the [`Metrics`] struct for easy tracking and management.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use token::{Allowance, GrantOutcome, TokenSnapshot};

/// Aggregated metrics for the tracker.
///
/// Metrics are registered with the global metrics registry on creation.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    /// Register metric descriptions with the global registry.
    fn register_descriptions() {
        describe_counter!(
            "tracker_snapshot_updates_total",
            "Total number of published token snapshot changes"
        );
        describe_counter!(
            "tracker_refresh_failures_total",
            "Total number of snapshot changes caused by a failed refresh"
        );
        describe_gauge!(
            "tracker_token_balance",
            "Current owner balance in token units"
        );
        describe_gauge!(
            "tracker_token_allowance",
            "Current spender allowance in token units (+Inf when unlimited)"
        );
        describe_counter!(
            "tracker_grants_total",
            "Total allowance grants by outcome"
        );
    }

    /// Record a published snapshot.
    pub fn record_snapshot(&self, snapshot: &TokenSnapshot) {
        counter!("tracker_snapshot_updates_total").increment(1);

        if snapshot.last_error.is_some() {
            counter!("tracker_refresh_failures_total").increment(1);
        }

        let Some(info) = &snapshot.info else {
            return;
        };

        if let Ok(balance) = info.balance.parse::<f64>() {
            gauge!("tracker_token_balance", "symbol" => info.symbol.clone()).set(balance);
        }

        let allowance = match &info.allowance {
            Allowance::Unlimited => Some(f64::INFINITY),
            Allowance::Limited(amount) => amount.parse::<f64>().ok(),
        };
        if let Some(allowance) = allowance {
            gauge!("tracker_token_allowance", "symbol" => info.symbol.clone()).set(allowance);
        }
    }

    /// Record the outcome of an allowance grant.
    pub fn record_grant(&self, outcome: &GrantOutcome) {
        counter!("tracker_grants_total", "outcome" => outcome.label()).increment(1);
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
