//! Bootstrap settings for [`init_telemetry`](crate::init_telemetry).

use crate::logging::LogConfig;
use crate::metrics::MetricsConfig;

/// Settings for logging and metrics, plus the service identity both report.
///
/// Build it through [`TelemetryConfig::builder`] so the service name reaches
/// the log fields and the `service` metric label alike.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name.
    pub service_name: String,

    /// Service version, reported once at startup.
    pub service_version: String,

    /// Deployment environment, reported once at startup.
    pub environment: String,

    /// Metrics recorder settings.
    pub metrics: MetricsConfig,

    /// Log subscriber settings.
    pub logging: LogConfig,
}

impl TelemetryConfig {
    /// Starts a builder from the defaults.
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder {
            config: Self::default(),
        }
    }

    fn sync_service_name(mut self) -> Self {
        self.metrics.service_name.clone_from(&self.service_name);
        self.logging.service_name.clone_from(&self.service_name);
        self
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "herald-service".to_string(),
            service_version: "unknown".to_string(),
            environment: "development".to_string(),
            metrics: MetricsConfig::default(),
            logging: LogConfig::default(),
        }
        .sync_service_name()
    }
}

/// Builder for [`TelemetryConfig`].
#[derive(Debug)]
pub struct TelemetryConfigBuilder {
    config: TelemetryConfig,
}

impl TelemetryConfigBuilder {
    /// Sets the service name.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.config.service_name = name.into();
        self
    }

    /// Sets the service version.
    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.config.service_version = version.into();
        self
    }

    /// Sets the deployment environment.
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.config.environment = environment.into();
        self
    }

    /// Replaces the metrics settings.
    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.config.metrics = metrics;
        self
    }

    /// Replaces the logging settings.
    pub fn logging(mut self, logging: LogConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Overrides only the log filter directive.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Finishes the builder. The service name overrides whatever the metrics
    /// and logging settings carried.
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        self.config.sync_service_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_share_service_name() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "herald-service");
        assert_eq!(config.metrics.service_name, "herald-service");
        assert_eq!(config.logging.service_name, "herald-service");
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_builder_identity() {
        let config = TelemetryConfig::builder()
            .service_name("orders")
            .service_version("2.0.0")
            .environment("production")
            .build();

        assert_eq!(config.service_name, "orders");
        assert_eq!(config.service_version, "2.0.0");
        assert_eq!(config.environment, "production");
    }

    #[test]
    fn test_service_name_wins_over_sub_configs() {
        let metrics = MetricsConfig {
            service_name: "stale".to_string(),
            ..MetricsConfig::default()
        };

        let config = TelemetryConfig::builder()
            .metrics(metrics)
            .service_name("billing")
            .build();

        assert_eq!(config.metrics.service_name, "billing");
        assert_eq!(config.logging.service_name, "billing");
    }

    #[test]
    fn test_log_level_after_logging() {
        let config = TelemetryConfig::builder()
            .logging(LogConfig::development())
            .log_level("warn")
            .build();

        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.json_format);
    }
}
