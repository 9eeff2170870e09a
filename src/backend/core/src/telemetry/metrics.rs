//! Prometheus recorder and the HTTP request metrics.

use metrics::{counter, describe_counter, describe_histogram, histogram, Label};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;

static PROMETHEUS: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global recorder. Repeated calls return the same handle.
pub fn install() -> anyhow::Result<&'static PrometheusHandle> {
    static INSTALL: Mutex<()> = Mutex::new(());
    let _guard = INSTALL.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(handle) = PROMETHEUS.get() {
        return Ok(handle);
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(PROMETHEUS.get_or_init(|| handle))
}

/// Prometheus text exposition; empty before [`install`].
pub fn render() -> String {
    PROMETHEUS.get().map(PrometheusHandle::render).unwrap_or_default()
}

pub fn record_request(method: &str, route: &str, status: u16, elapsed: Duration) {
    let labels = vec![
        Label::new("method", method.to_string()),
        Label::new("route", route.to_string()),
        Label::new("status", status.to_string()),
    ];
    counter!("salon_http_requests_total", labels.clone()).increment(1);
    histogram!("salon_http_request_duration_seconds", labels).record(elapsed.as_secs_f64());
}

fn describe_metrics() {
    describe_counter!("salon_http_requests_total", "HTTP requests by method, route and status");
    describe_histogram!(
        "salon_http_request_duration_seconds",
        "HTTP request latency in seconds"
    );
    describe_counter!("salon_errors_total", "Errors returned to clients by code");
    describe_counter!("salon_authz_decisions_total", "Permission checks by outcome");
    describe_counter!("salon_auth_failures_total", "Rejected bearer credentials by reason");
    describe_counter!(
        "salon_appointment_operations_total",
        "Appointment writes by operation"
    );
}
