//! Prometheus metrics collection.
//!
//! Provides application metrics in Prometheus format.

use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

/// Route label for requests no route matched.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Block label for block names rejected by the allow-list.
pub const FORBIDDEN_BLOCK: &str = "<forbidden>";

/// HTTP request labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    pub method: String,
    pub route: String,
    pub status: u16,
}

/// Block update labels.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct UpdateLabels {
    pub block: String,
    pub outcome: String,
}

/// Application metrics.
pub struct Metrics {
    registry: Registry,

    /// HTTP request counter by method/route/status.
    pub http_requests: Family<HttpLabels, Counter>,

    /// HTTP request duration histogram.
    pub http_duration_seconds: Family<HttpLabels, Histogram>,

    /// Post update attempts by block type and outcome.
    pub block_updates: Family<UpdateLabels, Counter>,
}

impl Metrics {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests = Family::<HttpLabels, Counter>::default();
        registry.register(
            "http_requests",
            "Total HTTP requests",
            http_requests.clone(),
        );

        let http_duration_seconds = Family::<HttpLabels, Histogram>::new_with_constructor(|| {
            Histogram::new(exponential_buckets(0.001, 2.0, 12))
        });
        registry.register(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
            http_duration_seconds.clone(),
        );

        let block_updates = Family::<UpdateLabels, Counter>::default();
        registry.register(
            "block_updates",
            "Post update attempts by block type and outcome",
            block_updates.clone(),
        );

        Self {
            registry,
            http_requests,
            http_duration_seconds,
            block_updates,
        }
    }

    /// Record an HTTP request.
    ///
    /// `route` is the matched route template (`/posts/{id}`), never the raw
    /// path, or [`UNMATCHED_ROUTE`].
    pub fn record_request(&self, method: &str, route: &str, status: u16, duration_secs: f64) {
        let labels = HttpLabels {
            method: method.to_string(),
            route: route.to_string(),
            status,
        };

        self.http_requests.get_or_create(&labels).inc();
        self.http_duration_seconds
            .get_or_create(&labels)
            .observe(duration_secs);
    }

    /// Record one post update attempt.
    ///
    /// `outcome` is "updated", "unchanged", or an error kind.
    pub fn record_update(&self, block: &str, outcome: &str) {
        let labels = UpdateLabels {
            block: block.to_string(),
            outcome: outcome.to_string(),
        };
        self.block_updates.get_or_create(&labels).inc();
    }

    /// Encode metrics in Prometheus text format.
    ///
    /// # Panics
    ///
    /// Panics if Prometheus metric encoding to a `String` buffer fails.
    /// The `fmt::Write` impl for `String` is infallible.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        #[allow(clippy::expect_used)]
        encode(&mut buffer, &self.registry).expect("encoding metrics");
        buffer
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_request() {
        let metrics = Metrics::new();
        metrics.record_request("GET", "/block-updater/posts", 200, 0.05);

        let output = metrics.encode();
        assert!(output.contains("http_requests_total{"));
        assert!(output.contains("route=\"/block-updater/posts\""));
        assert!(!output.contains("_total_total"));
    }

    #[test]
    fn test_record_update() {
        let metrics = Metrics::new();
        metrics.record_update("acme/hero", "updated");
        metrics.record_update("acme/hero", "updated");

        let output = metrics.encode();
        assert!(output.contains(
            "block_updates_total{block=\"acme/hero\",outcome=\"updated\"} 2"
        ));
        assert!(!output.contains("_total_total"));
    }
}
