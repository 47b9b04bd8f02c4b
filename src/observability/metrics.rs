//! Metrics collection and exposition.
//!
//! # Metrics
//! - `monitor_probes_dispatched_total` (counter)
//! - `monitor_publish_failures_total` (counter)
//! - `monitor_callbacks_total` (counter): by outcome (healthy, late, unmatched)
//! - `monitor_probes_expired_total` (counter)
//! - `monitor_probe_latency_seconds` (histogram): resolved round trips
//! - `monitor_pending_probes` (gauge)
//! - `monitor_health_probe_runs_total` (counter): by outcome
//! - `monitor_alerts_total` (counter): by delivery result
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - Prometheus exporter runs its own HTTP listener

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_dispatch(success: bool) {
    if success {
        counter!("monitor_probes_dispatched_total").increment(1);
    } else {
        counter!("monitor_publish_failures_total").increment(1);
    }
}

pub fn record_callback(outcome: &'static str, latency_secs: Option<f64>) {
    counter!("monitor_callbacks_total", "outcome" => outcome).increment(1);
    if let Some(latency) = latency_secs {
        histogram!("monitor_probe_latency_seconds").record(latency);
    }
}

pub fn record_expired(count: usize) {
    counter!("monitor_probes_expired_total").increment(count as u64);
}

pub fn record_pending(count: usize) {
    gauge!("monitor_pending_probes").set(count as f64);
}

pub fn record_health_probe(outcome: &'static str) {
    counter!("monitor_health_probe_runs_total", "outcome" => outcome).increment(1);
}

pub fn record_alert(delivered: bool) {
    let result = if delivered { "delivered" } else { "failed" };
    counter!("monitor_alerts_total", "result" => result).increment(1);
}
