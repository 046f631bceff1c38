//! Metrics registries and tracing setup
//!
//! Each service owns one registry of atomic counters, shared across request
//! handlers and read by the `/metrics` endpoint as a serialized snapshot.
//! Counters only ever increase; gauges (breaker state, available tokens) are
//! read live from their owners at snapshot time.

use std::sync::atomic::{AtomicU64, Ordering};

use loadlab_common::chaos::DependencyClass;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Counters for the payment service.
#[derive(Debug, Default)]
pub struct PaymentMetrics {
    requests_total: AtomicU64,
    processed_total: AtomicU64,
    rate_limited_total: AtomicU64,
    circuit_open_total: AtomicU64,
    dependency_failed_total: AtomicU64,
    cache_hits_total: AtomicU64,
    lag_database_total: AtomicU64,
    lag_cache_total: AtomicU64,
    lag_external_total: AtomicU64,
}

/// Point-in-time view of [`PaymentMetrics`] plus live resilience gauges.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetricsSnapshot {
    pub requests_total: u64,
    pub processed_total: u64,
    pub rate_limited_total: u64,
    pub circuit_open_total: u64,
    pub dependency_failed_total: u64,
    pub cache_hits_total: u64,
    pub lag_database_total: u64,
    pub lag_cache_total: u64,
    pub lag_external_total: u64,
    pub circuit_state: String,
    pub available_tokens: u64,
}

impl PaymentMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_processed(&self, cache_hit: bool, lag_injections: &[DependencyClass]) {
        self.processed_total.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.cache_hits_total.fetch_add(1, Ordering::Relaxed);
        }
        for class in lag_injections {
            let counter = match class {
                DependencyClass::Database => &self.lag_database_total,
                DependencyClass::Cache => &self.lag_cache_total,
                DependencyClass::External => &self.lag_external_total,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_circuit_open(&self) {
        self.circuit_open_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dependency_failed(&self) {
        self.dependency_failed_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters together with the live resilience gauges.
    pub fn snapshot(&self, circuit_state: String, available_tokens: u64) -> PaymentMetricsSnapshot {
        PaymentMetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            processed_total: self.processed_total.load(Ordering::Relaxed),
            rate_limited_total: self.rate_limited_total.load(Ordering::Relaxed),
            circuit_open_total: self.circuit_open_total.load(Ordering::Relaxed),
            dependency_failed_total: self.dependency_failed_total.load(Ordering::Relaxed),
            cache_hits_total: self.cache_hits_total.load(Ordering::Relaxed),
            lag_database_total: self.lag_database_total.load(Ordering::Relaxed),
            lag_cache_total: self.lag_cache_total.load(Ordering::Relaxed),
            lag_external_total: self.lag_external_total.load(Ordering::Relaxed),
            circuit_state,
            available_tokens,
        }
    }
}

/// Counters for the antifraud service.
#[derive(Debug, Default)]
pub struct AntifraudMetrics {
    events_total: AtomicU64,
    fraud_detected_total: AtomicU64,
}

/// Point-in-time view of [`AntifraudMetrics`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AntifraudMetricsSnapshot {
    pub events_total: u64,
    pub fraud_detected_total: u64,
}

impl AntifraudMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self, fraud_detected: bool) {
        self.events_total.fetch_add(1, Ordering::Relaxed);
        if fraud_detected {
            self.fraud_detected_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> AntifraudMetricsSnapshot {
        AntifraudMetricsSnapshot {
            events_total: self.events_total.load(Ordering::Relaxed),
            fraud_detected_total: self.fraud_detected_total.load(Ordering::Relaxed),
        }
    }
}

/// Initialize tracing for a service binary.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. Set
/// `LOADLAB_LOG_FORMAT=json` for machine-readable output. Safe to call more
/// than once; later calls are no-ops.
pub fn init_tracing(service: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOADLAB_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if result.is_ok() {
        tracing::info!(service, "tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_snapshot_reflects_recorded_outcomes() {
        let metrics = PaymentMetrics::new();

        for _ in 0..5 {
            metrics.record_request();
        }
        metrics.record_processed(true, &[DependencyClass::Database, DependencyClass::External]);
        metrics.record_processed(false, &[]);
        metrics.record_rate_limited();
        metrics.record_circuit_open();
        metrics.record_dependency_failed();

        let snapshot = metrics.snapshot("closed".to_string(), 42);
        assert_eq!(snapshot.requests_total, 5);
        assert_eq!(snapshot.processed_total, 2);
        assert_eq!(snapshot.cache_hits_total, 1);
        assert_eq!(snapshot.lag_database_total, 1);
        assert_eq!(snapshot.lag_cache_total, 0);
        assert_eq!(snapshot.lag_external_total, 1);
        assert_eq!(snapshot.rate_limited_total, 1);
        assert_eq!(snapshot.circuit_open_total, 1);
        assert_eq!(snapshot.dependency_failed_total, 1);
        assert_eq!(snapshot.circuit_state, "closed");
        assert_eq!(snapshot.available_tokens, 42);
    }

    #[test]
    fn antifraud_snapshot_counts_fraud_separately() {
        let metrics = AntifraudMetrics::new();
        metrics.record_event(false);
        metrics.record_event(true);
        metrics.record_event(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_total, 3);
        assert_eq!(snapshot.fraud_detected_total, 1);
    }

    #[test]
    fn snapshots_serialize_with_camel_case_names() {
        let metrics = PaymentMetrics::new();
        let json = serde_json::to_value(metrics.snapshot("open".to_string(), 0)).unwrap();
        assert!(json.get("requestsTotal").is_some());
        assert!(json.get("circuitState").is_some());
        assert!(json.get("requests_total").is_none());
    }
}
