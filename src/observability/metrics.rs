//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define daemon metrics (listeners, binds, connections)
//! - Expose Prometheus-compatible metrics endpoint
//! - Keep reconciliation outcomes countable over time
//!
//! # Metrics
//! - `hearthd_listeners_bound` (gauge): listeners currently bound
//! - `hearthd_bind_failures_total` (counter): failed bind attempts
//! - `hearthd_listeners_removed_total` (counter): listeners closed by rehash
//! - `hearthd_rehashes_total` (counter): reconciliation passes run
//! - `hearthd_active_connections` (gauge): open client connections
//! - `hearthd_connections_total` (counter): client connections accepted
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Recording is a no-op until the exporter is installed, so library
//!   consumers and tests pay nothing

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::net::reconcile::ReconcileReport;

/// Install the Prometheus exporter and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe();
            tracing::info!(address = %addr, "Metrics endpoint listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to start metrics endpoint");
        }
    }
}

fn describe() {
    metrics::describe_gauge!("hearthd_listeners_bound", "Listeners currently bound");
    metrics::describe_counter!("hearthd_bind_failures_total", "Failed bind attempts");
    metrics::describe_counter!(
        "hearthd_listeners_removed_total",
        "Listeners closed because the config dropped them"
    );
    metrics::describe_counter!("hearthd_rehashes_total", "Reconciliation passes run");
    metrics::describe_gauge!("hearthd_active_connections", "Open client connections");
    metrics::describe_counter!("hearthd_connections_total", "Client connections accepted");
}

/// Record the outcome of one reconciliation pass.
pub fn record_reconcile(report: &ReconcileReport, live_listeners: usize) {
    metrics::counter!("hearthd_rehashes_total").increment(1);
    metrics::gauge!("hearthd_listeners_bound").set(live_listeners as f64);
    if !report.failures.is_empty() {
        metrics::counter!("hearthd_bind_failures_total").increment(report.failures.len() as u64);
    }
    if !report.removed.is_empty() {
        metrics::counter!("hearthd_listeners_removed_total").increment(report.removed.len() as u64);
    }
}

/// Record a newly accepted client connection.
pub fn record_connection_opened() {
    metrics::gauge!("hearthd_active_connections").increment(1.0);
    metrics::counter!("hearthd_connections_total").increment(1);
}

/// Record a client connection closing.
pub fn record_connection_closed() {
    metrics::gauge!("hearthd_active_connections").decrement(1.0);
}
