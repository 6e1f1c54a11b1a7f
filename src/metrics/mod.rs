//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Quote requests and latency
//! - Status checks
//! - Ledger writes
//! - Simulator outcomes

use crate::error::OmniPayResult;

use axum::{routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram, CounterVec, Encoder, Histogram, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    // Quote metrics
    pub static ref QUOTE_REQUESTS: CounterVec = register_counter_vec!(
        "omnipay_quote_requests_total",
        "Total quote requests by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref QUOTE_LATENCY: Histogram = register_histogram!(
        "omnipay_quote_latency_seconds",
        "Routing provider quote latency",
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    // Status check metrics
    pub static ref STATUS_CHECKS: CounterVec = register_counter_vec!(
        "omnipay_status_checks_total",
        "Total transfer status checks by outcome",
        &["outcome"]
    ).unwrap();

    // Ledger metrics
    pub static ref LEDGER_WRITES: CounterVec = register_counter_vec!(
        "omnipay_ledger_writes_total",
        "Total ledger write attempts by result",
        &["result"]
    ).unwrap();

    // Simulator metrics
    pub static ref SIMULATIONS: CounterVec = register_counter_vec!(
        "omnipay_simulations_total",
        "Total simulated transfers by outcome",
        &["outcome"]
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> OmniPayResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::error::OmniPayError::Internal(e.to_string()))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| crate::error::OmniPayError::Internal(e.to_string()))?;

        Ok(())
    }
}

async fn metrics_handler() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap_or_default();
    String::from_utf8(buffer).unwrap_or_default()
}

// Helper functions to record metrics

pub fn record_quote_request(outcome: &str) {
    QUOTE_REQUESTS.with_label_values(&[outcome]).inc();
}

pub fn record_quote_latency(latency_secs: f64) {
    QUOTE_LATENCY.observe(latency_secs);
}

pub fn record_status_check(outcome: &str) {
    STATUS_CHECKS.with_label_values(&[outcome]).inc();
}

pub fn record_ledger_write(result: &str) {
    LEDGER_WRITES.with_label_values(&[result]).inc();
}

pub fn record_simulation(outcome: &str) {
    SIMULATIONS.with_label_values(&[outcome]).inc();
}
