use std::time::Duration;

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("readings_service=info".parse().unwrap_or_else(|_| "info".parse().unwrap()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Sink for request-level telemetry.
///
/// The gateway reports through this trait instead of touching the metrics
/// registry directly, so tests run without a live recorder.
pub trait TelemetrySink: Send + Sync {
    fn http_request(&self, route: &str, method: &str, status: u16, elapsed: Duration);
    fn upstream_call(&self, outcome: &str, elapsed: Duration);
}

/// Production sink backed by the process-wide Prometheus recorder
/// (see `metrics_server`).
pub struct PrometheusSink;

impl TelemetrySink for PrometheusSink {
    fn http_request(&self, route: &str, method: &str, status: u16, elapsed: Duration) {
        metrics::counter!(
            "gateway_http_requests_total",
            "route" => route.to_string(),
            "method" => method.to_string(),
            "status" => status.to_string(),
        )
        .increment(1);
        metrics::histogram!(
            "gateway_http_request_duration_seconds",
            "route" => route.to_string(),
            "method" => method.to_string(),
        )
        .record(elapsed.as_secs_f64());
    }

    fn upstream_call(&self, outcome: &str, elapsed: Duration) {
        metrics::counter!(
            "gateway_upstream_requests_total",
            "outcome" => outcome.to_string(),
        )
        .increment(1);
        metrics::histogram!("gateway_upstream_duration_seconds").record(elapsed.as_secs_f64());
    }
}
