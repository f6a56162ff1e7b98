//! Prometheus Metrics Module
//!
//! Application-wide metrics, exposed in text format at `/metrics`.
//!
//! Collected:
//! - HTTP request counts and latency, labeled by method and route
//! - open SSE subscriptions
//! - push events published, by event name
//! - database pool utilization

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

const NAMESPACE: &str = "skillswap";

/// Latency buckets from sub-millisecond to ten seconds.
const LATENCY_BUCKETS: [f64; 12] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_all(&registry);
    registry
});

/// Requests served, by method, route and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// Request latency histogram, by method and route
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(LATENCY_BUCKETS.to_vec()),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Open SSE subscriptions
pub static SSE_SUBSCRIBERS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "sse_subscribers_active",
            "Number of open server-sent event subscriptions",
        )
        .namespace(NAMESPACE),
    )
    .expect("Failed to create SSE_SUBSCRIBERS_ACTIVE metric")
});

/// Push events published, by SSE event name
pub static EVENTS_PUBLISHED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("events_published_total", "Push events published to the bus")
            .namespace(NAMESPACE),
        &["event"],
    )
    .expect("Failed to create EVENTS_PUBLISHED_TOTAL metric")
});

/// Database pool utilization, labeled idle/active/max
pub static DB_POOL_CONNECTIONS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("db_pool_connections", "Database connection pool statistics")
            .namespace(NAMESPACE),
        &["state"],
    )
    .expect("Failed to create DB_POOL_CONNECTIONS metric")
});

fn register_all(registry: &Registry) {
    let collectors: [Box<dyn prometheus::core::Collector>; 5] = [
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(SSE_SUBSCRIBERS_ACTIVE.clone()),
        Box::new(EVENTS_PUBLISHED_TOTAL.clone()),
        Box::new(DB_POOL_CONNECTIONS.clone()),
    ];
    for collector in collectors {
        registry
            .register(collector)
            .expect("Metric registration failed");
    }
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// Record one served request
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Count a published push event
pub fn record_event_published(event: &str) {
    EVENTS_PUBLISHED_TOTAL.with_label_values(&[event]).inc();
}

/// Refresh database pool gauges
pub fn update_db_pool_stats(idle: u32, active: u32, max: u32) {
    for (state, value) in [("idle", idle), ("active", active), ("max", max)] {
        DB_POOL_CONNECTIONS
            .with_label_values(&[state])
            .set(value as f64);
    }
}

/// RAII guard that tracks one open SSE subscription.
pub struct SseSubscriberGuard;

impl SseSubscriberGuard {
    pub fn new() -> Self {
        SSE_SUBSCRIBERS_ACTIVE.inc();
        SseSubscriberGuard
    }
}

impl Default for SseSubscriberGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SseSubscriberGuard {
    fn drop(&mut self) {
        SSE_SUBSCRIBERS_ACTIVE.dec();
    }
}
