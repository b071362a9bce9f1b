use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, IntCounter, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all server metrics
const PREFIX: &str = "tunes";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "route", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "route"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Enrichment Metrics
    pub static ref ENRICHMENT_FETCHES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_enrichment_fetches_total"), "Enrichment lookups by source and outcome"),
        &["source", "outcome"]
    ).expect("Failed to create enrichment_fetches_total metric");

    // Library Metrics
    pub static ref SONGS_CREATED_TOTAL: IntCounter = IntCounter::new(
        format!("{PREFIX}_songs_created_total"),
        "Songs created since startup"
    ).expect("Failed to create songs_created_total metric");

    pub static ref ACTIVE_SONGS: Gauge = Gauge::new(
        format!("{PREFIX}_active_songs"),
        "Number of songs that are not soft deleted"
    ).expect("Failed to create active_songs metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Already registered errors are expected when tests initialize repeatedly
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(ENRICHMENT_FETCHES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SONGS_CREATED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ACTIVE_SONGS.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Seeds the library gauge from the store contents at startup.
pub fn init_library_metrics(active_songs: usize) {
    ACTIVE_SONGS.set(active_songs as f64);
    tracing::info!("Library metrics initialized: {} active songs", active_songs);
}

/// Collapses numeric path segments so that every song maps to the same label.
pub fn route_label(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let route = route_label(path);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, &route, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, &route])
        .observe(duration.as_secs_f64());
}

/// Record the outcome ("hit", "not_found", "failed") of an enrichment lookup
pub fn record_enrichment_fetch(source: &str, outcome: &str) {
    ENRICHMENT_FETCHES_TOTAL
        .with_label_values(&[source, outcome])
        .inc();
}

pub fn record_song_created() {
    SONGS_CREATED_TOTAL.inc();
    ACTIVE_SONGS.inc();
}

pub fn record_song_deleted() {
    ACTIVE_SONGS.dec();
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
