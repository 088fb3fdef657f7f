//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_rate_limited_total` (counter): rejections by tier
//! - `edge_origin_rejected_total` (counter): `/api/keys` origin refusals
//! - `edge_keys_issued_total` (counter): successful credential deliveries
//! - `edge_body_rejected_total` (counter): body rejections by reason
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! deployments without the exporter pay nothing.

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rate_limited(tier: &'static str) {
    counter!("edge_requests_rate_limited_total", "tier" => tier).increment(1);
}

pub fn record_origin_rejected() {
    counter!("edge_origin_rejected_total").increment(1);
}

pub fn record_keys_issued() {
    counter!("edge_keys_issued_total").increment(1);
}

pub fn record_body_rejected(reason: &'static str) {
    counter!("edge_body_rejected_total", "reason" => reason).increment(1);
}
