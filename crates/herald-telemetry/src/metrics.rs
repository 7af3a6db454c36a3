//! Prometheus metrics for Herald.
//!
//! | Metric                            | Type      | Labels           |
//! |-----------------------------------|-----------|------------------|
//! | `herald_requests_total`           | Counter   | `status`         |
//! | `herald_request_duration_seconds` | Histogram | `status`         |
//! | `herald_faults_total`             | Counter   | `kind`, `status` |
//! | `herald_auth_rewrites_total`      | Counter   | `status`         |
//!
//! Recording is always safe: without an installed recorder the `metrics`
//! macros are no-ops. The rendered text is available from
//! [`render_metrics`] for the host application to expose.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use herald_core::FaultKind;
use http::StatusCode;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Total requests leaving the pipeline.
pub const REQUESTS_TOTAL: &str = "herald_requests_total";

/// Request latency histogram.
pub const REQUEST_DURATION_SECONDS: &str = "herald_request_duration_seconds";

/// Faults translated into envelopes.
pub const FAULTS_TOTAL: &str = "herald_faults_total";

/// Authentication outcomes rewritten into envelopes.
pub const AUTH_REWRITES_TOTAL: &str = "herald_auth_rewrites_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Service name, attached to every metric as the `service` label.
    pub service_name: String,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "herald".to_string(),
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the global Prometheus recorder.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidConfig`] for an empty bucket list and
/// [`TelemetryError::MetricsInit`] if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    if config.duration_buckets.is_empty() {
        return Err(TelemetryError::InvalidConfig(
            "duration_buckets must not be empty".to_string(),
        ));
    }

    let handle = PrometheusBuilder::new()
        .add_global_label("service", config.service_name.clone())
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if [`init_metrics`] has not installed a recorder.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total requests that left the pipeline");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        "Time spent inside the pipeline, in seconds"
    );
    describe_counter!(
        FAULTS_TOTAL,
        "Faults translated into error envelopes, by kind"
    );
    describe_counter!(
        AUTH_REWRITES_TOTAL,
        "401/403 outcomes rewritten into error envelopes"
    );
}

/// Records a request leaving the pipeline.
pub fn record_request(status: StatusCode, duration: Duration) {
    let status = status.as_u16().to_string();
    counter!(REQUESTS_TOTAL, "status" => status.clone()).increment(1);
    histogram!(REQUEST_DURATION_SECONDS, "status" => status).record(duration.as_secs_f64());
}

/// Records a translated fault.
pub fn record_fault(kind: FaultKind, status: StatusCode) {
    counter!(
        FAULTS_TOTAL,
        "kind" => kind.as_str(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
}

/// Records a rewritten authentication outcome.
pub fn record_auth_rewrite(status: StatusCode) {
    counter!(AUTH_REWRITES_TOTAL, "status" => status.as_u16().to_string()).increment(1);
}
