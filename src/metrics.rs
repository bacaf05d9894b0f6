//! Prometheus metrics for scans and the HTTP API.
//!
//! This module provides metrics for:
//! - Scan latency
//! - HTTP request latency
//! - Events evaluated, skipped and opportunities found
//! - Quotes discarded by reason

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Scan latency metric name.
pub const METRIC_SCAN_LATENCY: &str = "scan_latency_ms";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Events evaluated counter metric name.
pub const METRIC_EVENTS_EVALUATED: &str = "events_evaluated_total";
/// Events skipped counter metric name.
pub const METRIC_EVENTS_SKIPPED: &str = "events_skipped_total";
/// Opportunities detected counter metric name.
pub const METRIC_OPPORTUNITIES_DETECTED: &str = "opportunities_detected_total";
/// Quotes discarded counter metric name.
pub const METRIC_QUOTES_DISCARDED: &str = "quotes_discarded_total";
/// Snapshot replacements counter metric name.
pub const METRIC_SNAPSHOTS_LOADED: &str = "snapshots_loaded_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_SCAN_LATENCY,
        "Time to scan a quote snapshot in milliseconds"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );

    describe_counter!(
        METRIC_EVENTS_EVALUATED,
        "Total number of events evaluated for arbitrage"
    );
    describe_counter!(
        METRIC_EVENTS_SKIPPED,
        "Total number of events skipped, by reason"
    );
    describe_counter!(
        METRIC_OPPORTUNITIES_DETECTED,
        "Total number of arbitrage opportunities detected"
    );
    describe_counter!(
        METRIC_QUOTES_DISCARDED,
        "Total number of quotes discarded, by reason"
    );
    describe_counter!(
        METRIC_SNAPSHOTS_LOADED,
        "Total number of quote snapshots loaded"
    );

    debug!("Metrics initialized");
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Increment events evaluated counter.
pub fn inc_events_evaluated() {
    counter!(METRIC_EVENTS_EVALUATED).increment(1);
}

/// Increment events skipped counter.
pub fn inc_events_skipped(reason: &'static str) {
    counter!(METRIC_EVENTS_SKIPPED, "reason" => reason).increment(1);
}

/// Increment opportunities detected counter.
pub fn inc_opportunities_detected() {
    counter!(METRIC_OPPORTUNITIES_DETECTED).increment(1);
}

/// Increment quotes discarded counter by one.
pub fn inc_quotes_discarded(reason: &'static str) {
    inc_quotes_discarded_by(reason, 1);
}

/// Increment quotes discarded counter.
pub fn inc_quotes_discarded_by(reason: &'static str, count: u64) {
    counter!(METRIC_QUOTES_DISCARDED, "reason" => reason).increment(count);
}

/// Increment snapshots loaded counter.
pub fn inc_snapshots_loaded() {
    counter!(METRIC_SNAPSHOTS_LOADED).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for a snapshot scan.
pub fn timer_scan() -> LatencyTimer {
    LatencyTimer::new(METRIC_SCAN_LATENCY)
}
