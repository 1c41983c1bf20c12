use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

// ---------------------------------------------------------------------------
// Metrics catalog
// ---------------------------------------------------------------------------

/// Register all metric descriptors at startup.
///
/// This must be called once before any metrics are recorded.
pub fn describe_all_metrics() {
    // -- HTTP --
    describe_counter!(
        "clipvault_http_requests_total",
        "API requests by endpoint and status class"
    );
    describe_counter!(
        "clipvault_auth_failures_total",
        "Requests rejected for a missing or wrong Auth header"
    );

    // -- Ingest --
    describe_counter!(
        "clipvault_resolve_total",
        "Crawler resolutions by outcome"
    );
    describe_histogram!(
        "clipvault_resolve_duration_seconds",
        "Crawler resolution latency"
    );
    describe_histogram!(
        "clipvault_download_duration_seconds",
        "Video download latency"
    );
    describe_counter!(
        "clipvault_download_bytes_total",
        "Total bytes downloaded from video CDNs"
    );
    describe_histogram!(
        "clipvault_upload_duration_seconds",
        "End-to-end parse_and_upload duration"
    );
    describe_histogram!("clipvault_upload_size_bytes", "Archived video size");

    // -- Storage --
    describe_histogram!(
        "clipvault_storage_duration_seconds",
        "Object store operation latency"
    );
    describe_counter!(
        "clipvault_storage_errors_total",
        "Object store operation errors"
    );

    // -- System --
    describe_gauge!("clipvault_uptime_seconds", "Process uptime");
    describe_counter!(
        "clipvault_panic_total",
        "Total panics caught (should always be 0)"
    );
}

// ---------------------------------------------------------------------------
// Metric recording helpers
// ---------------------------------------------------------------------------

// -- HTTP --

pub fn inc_http_request(endpoint: &str, status: u16) {
    counter!(
        "clipvault_http_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status_class(status)
    )
    .increment(1);
}

pub fn inc_auth_failure(endpoint: &str) {
    counter!("clipvault_auth_failures_total", "endpoint" => endpoint.to_string()).increment(1);
}

// -- Ingest --

pub fn inc_resolve(outcome: &'static str) {
    counter!("clipvault_resolve_total", "outcome" => outcome).increment(1);
}

pub fn record_resolve_duration(seconds: f64) {
    histogram!("clipvault_resolve_duration_seconds").record(seconds);
}

pub fn record_download_duration(seconds: f64) {
    histogram!("clipvault_download_duration_seconds").record(seconds);
}

pub fn add_download_bytes(bytes: u64) {
    counter!("clipvault_download_bytes_total").increment(bytes);
}

pub fn record_upload_duration(seconds: f64) {
    histogram!("clipvault_upload_duration_seconds").record(seconds);
}

pub fn record_upload_size(bytes: f64) {
    histogram!("clipvault_upload_size_bytes").record(bytes);
}

// -- Storage --

pub fn record_storage_duration(operation: &'static str, seconds: f64) {
    histogram!("clipvault_storage_duration_seconds", "operation" => operation).record(seconds);
}

pub fn inc_storage_error(operation: &'static str) {
    counter!("clipvault_storage_errors_total", "operation" => operation).increment(1);
}

// -- System --

pub fn set_uptime_seconds(seconds: f64) {
    gauge!("clipvault_uptime_seconds").set(seconds);
}

pub fn inc_panic_total() {
    counter!("clipvault_panic_total").increment(1);
}

// ---------------------------------------------------------------------------
// Status code bucket helper
// ---------------------------------------------------------------------------

/// Collapse an HTTP status into its class label (`2xx`, `4xx`, ...).
pub fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

// ---------------------------------------------------------------------------
// Uptime tracking task
// ---------------------------------------------------------------------------

/// Update the uptime gauge every second until cancelled.
pub async fn run_uptime_task(start_time: Instant, cancel: tokio_util::sync::CancellationToken) {
    let interval = std::time::Duration::from_secs(1);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {
                set_uptime_seconds(start_time.elapsed().as_secs_f64());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Prometheus recorder installation
// ---------------------------------------------------------------------------

/// Install the Prometheus metrics recorder.
///
/// This sets up the global `metrics` recorder backed by `metrics-exporter-prometheus`.
/// Returns a handle that can render the metrics as Prometheus text exposition format.
pub fn install_prometheus_recorder() -> anyhow::Result<metrics_exporter_prometheus::PrometheusHandle>
{
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus metrics recorder: {}", e))
}
