//! Root configuration type.
//!
//! This module provides [`HeraldConfig`] and its builder.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, PipelineSection, TelemetrySection};

/// Complete Herald configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use herald_config::HeraldConfig;
///
/// let config = HeraldConfig::default();
/// assert_eq!(config.telemetry.service_name, "herald-service");
/// assert_eq!(config.pipeline.log_directory.to_str(), Some("Logs"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct HeraldConfig {
    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetrySection,

    /// Request pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineSection,
}

impl HeraldConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> HeraldConfigBuilder {
        HeraldConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let telemetry = &self.telemetry;

        if telemetry.service_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.service_name",
                "must not be empty",
            ));
        }

        if telemetry.logging.enabled {
            herald_telemetry::logging::create_env_filter(&telemetry.logging.level).map_err(
                |e| ConfigError::invalid_value("telemetry.logging.level", e.to_string()),
            )?;
        }

        if telemetry.metrics.enabled {
            let buckets = &telemetry.metrics.duration_buckets;
            if buckets.is_empty() {
                return Err(ConfigError::invalid_value(
                    "telemetry.metrics.duration_buckets",
                    "must not be empty",
                ));
            }
            if buckets.iter().any(|b| !b.is_finite() || *b <= 0.0) {
                return Err(ConfigError::invalid_value(
                    "telemetry.metrics.duration_buckets",
                    "must be positive finite numbers",
                ));
            }
            if buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(ConfigError::invalid_value(
                    "telemetry.metrics.duration_buckets",
                    "must be strictly increasing",
                ));
            }
        }

        if self.pipeline.log_directory.as_os_str().is_empty() {
            return Err(ConfigError::invalid_value(
                "pipeline.log_directory",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty logs at debug level with source locations and span events.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        let logging = &mut config.telemetry.logging;
        logging.level = "debug".to_string();
        logging.format = LogFormat::Pretty;
        logging.include_location = true;
        logging.span_events = true;

        config.telemetry.environment = "development".to_string();
        config
    }

    /// Create a production configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use herald_config::{HeraldConfig, LogFormat};
    ///
    /// let config = HeraldConfig::production();
    /// assert_eq!(config.telemetry.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        let logging = &mut config.telemetry.logging;
        logging.level = "info".to_string();
        logging.format = LogFormat::Json;
        logging.include_location = false;
        logging.span_events = false;

        config.telemetry.environment = "production".to_string();
        config
    }
}

/// Builder for [`HeraldConfig`].
#[derive(Debug, Default)]
pub struct HeraldConfigBuilder {
    telemetry: Option<TelemetrySection>,
    pipeline: Option<PipelineSection>,
}

impl HeraldConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Set the pipeline section.
    #[must_use]
    pub fn pipeline(mut self, pipeline: PipelineSection) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> HeraldConfig {
        HeraldConfig {
            telemetry: self.telemetry.unwrap_or_default(),
            pipeline: self.pipeline.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<HeraldConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
