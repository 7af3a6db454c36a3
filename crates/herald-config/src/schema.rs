//! Configuration schema types.
//!
//! This module defines the structure of every configuration section.

use herald_core::DEFAULT_LOG_DIRECTORY;
use herald_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pipeline configuration section.
///
/// Controls the request tagging stage. The stage order itself is fixed and
/// not configurable.
///
/// # Example
///
/// ```
/// use herald_config::PipelineSection;
///
/// let section: PipelineSection = toml::from_str(r#"log_directory = "/var/log/orders""#).unwrap();
/// assert_eq!(section.log_directory.to_str(), Some("/var/log/orders"));
/// assert!(!section.trust_incoming_request_id);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    /// Directory that per-request log targets are placed under.
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,

    /// Reuse a valid `x-request-id` header from the caller instead of
    /// generating a new id.
    #[serde(default)]
    pub trust_incoming_request_id: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            log_directory: default_log_directory(),
            trust_incoming_request_id: false,
        }
    }
}

fn default_log_directory() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIRECTORY)
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Install the Prometheus recorder.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Histogram bucket boundaries for request duration, in seconds.
    #[serde(default = "default_duration_buckets")]
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_buckets: default_duration_buckets(),
        }
    }
}

impl MetricsSection {
    /// Converts this section into the telemetry crate's metrics settings.
    #[must_use]
    pub fn to_metrics_config(&self, service_name: &str) -> MetricsConfig {
        MetricsConfig {
            enabled: self.enabled,
            service_name: service_name.to_string(),
            duration_buckets: self.duration_buckets.clone(),
        }
    }
}

fn default_duration_buckets() -> Vec<f64> {
    MetricsConfig::default().duration_buckets
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g. `info` or `info,herald_middleware=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,

    /// Include thread ids in logs.
    #[serde(default)]
    pub thread_ids: bool,

    /// Log span open and close events.
    #[serde(default)]
    pub span_events: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
            thread_ids: false,
            span_events: false,
        }
    }
}

impl LoggingSection {
    /// Converts this section into the telemetry crate's logging settings.
    #[must_use]
    pub fn to_log_config(&self, service_name: &str) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            span_events: self.span_events,
            file_line_info: self.include_location,
            thread_ids: self.thread_ids,
            include_target: true,
            service_name: service_name.to_string(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Service name for logs and metric labels.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Service version.
    #[serde(default)]
    pub service_version: Option<String>,

    /// Deployment environment (e.g., "development", "staging", "production").
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsSection,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            service_version: None,
            environment: default_environment(),
            metrics: MetricsSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl TelemetrySection {
    /// Builds the settings consumed by `herald_telemetry::init_telemetry`.
    #[must_use]
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        let mut builder = TelemetryConfig::builder()
            .service_name(&self.service_name)
            .environment(&self.environment)
            .metrics(self.metrics.to_metrics_config(&self.service_name))
            .logging(self.logging.to_log_config(&self.service_name));

        if let Some(version) = &self.service_version {
            builder = builder.service_version(version);
        }

        builder.build()
    }
}

fn default_service_name() -> String {
    "herald-service".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_true() -> bool {
    true
}
