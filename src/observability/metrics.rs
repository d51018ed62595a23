//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_get_server_total` (counter): selections by policy and outcome
//! - `balancer_registered_workers` (gauge): registry size
//! - `balancer_load_reports_total` (counter): load reports, by known/unknown worker
//! - `balancer_worker_load` (gauge): last reported load per worker
//! - `balancer_active_workers` (gauge): active workers after the last health cycle
//! - `balancer_health_cycles_total` (counter): health cycles by outcome

use std::net::SocketAddr;
use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::load_balancer::{Policy, WorkerId};

/// Install the Prometheus exporter and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_selection(policy: Policy, found: bool) {
    let outcome = if found { "found" } else { "unavailable" };
    counter!("balancer_get_server_total", "policy" => policy.as_str(), "outcome" => outcome).increment(1);
}

pub fn record_registration(registered: usize) {
    gauge!("balancer_registered_workers").set(registered as f64);
}

pub fn record_load_report(id: WorkerId, load: u8, known: bool) {
    counter!("balancer_load_reports_total", "known" => if known { "true" } else { "false" }).increment(1);
    if known {
        gauge!("balancer_worker_load", "worker" => id.to_string()).set(load as f64);
    }
}

pub fn record_health_cycle(outcome: &'static str, active: Option<usize>) {
    counter!("balancer_health_cycles_total", "outcome" => outcome).increment(1);
    if let Some(active) = active {
        gauge!("balancer_active_workers").set(active as f64);
    }
}
