//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by vendor and status
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `script_rewrites_total` (counter): rewrites performed, by vendor
//! - `rewrite_cache_hits_total` (counter): rewrite cache hits
//!
//! # Design Decisions
//! - Low-overhead updates; labels limited to vendor and status
//! - Exposition via the Prometheus exporter's own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "failed to start metrics endpoint"),
    }
}

/// Record one proxied request.
pub fn record_request(vendor: &str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "vendor" => vendor.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    metrics::histogram!(
        "proxy_request_duration_seconds",
        "vendor" => vendor.to_string(),
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a script rewrite.
pub fn record_rewrite(vendor: &str) {
    metrics::counter!("script_rewrites_total", "vendor" => vendor.to_string()).increment(1);
}

/// Record a rewrite-cache hit.
pub fn record_cache_hit() {
    metrics::counter!("rewrite_cache_hits_total").increment(1);
}
