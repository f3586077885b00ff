//! Prometheus metrics for monitoring.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

/// Metrics registry for the serving paths
#[derive(Debug)]
pub struct MetricsRegistry {
    /// Prometheus registry
    registry: Registry,
    /// Requests received on any entry point
    pub requests_total: Counter,
    /// Successful predictions
    pub predictions_total: Counter,
    /// Predictions labelled churn
    pub churn_predictions_total: Counter,
    /// Requests rejected for missing fields
    pub validation_failures_total: Counter,
    /// Requests that ended in an internal failure
    pub internal_failures_total: Counter,
    /// Artifact load attempts (successful or not)
    pub artifact_load_attempts: Gauge,
    /// Classifier latency histogram (nanoseconds)
    pub inference_latency_ns: Histogram,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    /// Create a new metrics registry
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Registry::default();

        // Counters
        let requests_total = Counter::default();
        registry.register(
            "churn_requests_total",
            "Total prediction requests received",
            requests_total.clone(),
        );

        let predictions_total = Counter::default();
        registry.register(
            "churn_predictions_total",
            "Total successful predictions",
            predictions_total.clone(),
        );

        let churn_predictions_total = Counter::default();
        registry.register(
            "churn_positive_predictions_total",
            "Predictions labelled Will Churn",
            churn_predictions_total.clone(),
        );

        let validation_failures_total = Counter::default();
        registry.register(
            "churn_validation_failures_total",
            "Requests rejected for missing required fields",
            validation_failures_total.clone(),
        );

        let internal_failures_total = Counter::default();
        registry.register(
            "churn_internal_failures_total",
            "Requests that failed with an internal error",
            internal_failures_total.clone(),
        );

        // Gauges
        let artifact_load_attempts = Gauge::default();
        registry.register(
            "churn_artifact_load_attempts",
            "Artifact load attempts since process start",
            artifact_load_attempts.clone(),
        );

        // 1us to ~0.5s
        let ns_buckets = exponential_buckets(1_000.0, 2.0, 20);
        let inference_latency_ns = Histogram::new(ns_buckets);
        registry.register(
            "churn_inference_latency_ns",
            "Classifier latency in nanoseconds",
            inference_latency_ns.clone(),
        );

        Self {
            registry,
            requests_total,
            predictions_total,
            churn_predictions_total,
            validation_failures_total,
            internal_failures_total,
            artifact_load_attempts,
            inference_latency_ns,
        }
    }

    /// Record an incoming request
    pub fn record_request(&self) {
        self.requests_total.inc();
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, churn: bool, latency_ns: u64) {
        self.predictions_total.inc();
        if churn {
            self.churn_predictions_total.inc();
        }
        self.inference_latency_ns.observe(latency_ns as f64);
    }

    /// Record a validation failure
    pub fn record_validation_failure(&self) {
        self.validation_failures_total.inc();
    }

    /// Record an internal failure
    pub fn record_internal_failure(&self) {
        self.internal_failures_total.inc();
    }

    /// Update the artifact load attempt gauge
    pub fn set_load_attempts(&self, attempts: u64) {
        self.artifact_load_attempts
            .set(i64::try_from(attempts).unwrap_or(i64::MAX));
    }

    /// Encode metrics for Prometheus scraping
    #[must_use]
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        if let Err(e) = encode(&mut buffer, &self.registry) {
            tracing::error!("Failed to encode metrics: {}", e);
        }
        buffer
    }

    /// Get registry reference
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = MetricsRegistry::new();

        metrics.record_request();
        metrics.record_prediction(true, 2_500);
        metrics.record_validation_failure();
        metrics.set_load_attempts(1);

        let output = metrics.encode();
        assert!(output.contains("churn_requests_total"));
        assert!(output.contains("churn_positive_predictions_total"));
        assert!(output.contains("churn_inference_latency_ns"));
        assert_eq!(metrics.churn_predictions_total.get(), 1);
        assert_eq!(metrics.internal_failures_total.get(), 0);
    }
}
