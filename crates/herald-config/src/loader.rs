//! Layered configuration loading.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! defaults, files, strings, and environment variables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{ConfigError, HeraldConfig, LogFormat};

/// Environment variable prefix used by [`ConfigLoader::with_env`].
pub const DEFAULT_ENV_PREFIX: &str = "HERALD";

/// Configuration loader with a layered approach.
///
/// Layers apply in order, later layers overriding earlier ones:
/// 1. Default values or a preset
/// 2. Configuration files and strings (TOML or JSON)
/// 3. Environment variables
///
/// A file only overrides the keys it sets. Everything else keeps the value
/// from the layer below.
///
/// # Example
///
/// ```no_run
/// use herald_config::ConfigLoader;
///
/// # fn main() -> Result<(), herald_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_file("herald.toml")?
///     .with_env()
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HeraldConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader starting from default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HeraldConfig::default(),
            env_prefix: None,
        }
    }

    /// Reset to default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HeraldConfig::default();
        self
    }

    /// Start from the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use herald_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HeraldConfig::development();
        self
    }

    /// Start from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HeraldConfig::production();
        self
    }

    /// Layer a configuration file over the current values.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or unreadable, has an
    /// unsupported extension, fails to parse, or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::unsupported_format(path.display().to_string()))?;

        let layer = parse_layer(&content, &format)?;
        self.merge_layer(layer)?;
        Ok(self)
    }

    /// Layer a configuration file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Layer configuration from a string in the given format (`toml` or
    /// `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unsupported or parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use herald_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [pipeline]
    ///     log_directory = "/var/log/orders"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.pipeline.log_directory.to_str(), Some("/var/log/orders"));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer = parse_layer(content, &format.to_lowercase())?;
        self.merge_layer(layer)?;
        Ok(self)
    }

    /// Enable environment overrides with the `HERALD` prefix.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Enable environment overrides with a custom prefix.
    ///
    /// Variables use the form `PREFIX__SECTION__KEY`, for example
    /// `HERALD__PIPELINE__LOG_DIRECTORY=/var/log/orders` or
    /// `HERALD__TELEMETRY__LOGGING__LEVEL=debug`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load variables from a `.env` file in the working directory or its
    /// parents, if one exists.
    ///
    /// Variables already set in the process environment win.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if a `.env` file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(ConfigError::Dotenv(err.to_string())),
        }
    }

    /// Load variables from a specific `.env` file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file is missing or malformed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref()).map_err(|e| ConfigError::Dotenv(e.to_string()))?;
        Ok(self)
    }

    /// Apply environment overrides, validate, and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable fails to parse or the
    /// final configuration is invalid.
    pub fn load(mut self) -> Result<HeraldConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix, env::vars())?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HeraldConfig {
        self.config
    }

    fn merge_layer(&mut self, layer: Value) -> Result<(), ConfigError> {
        let mut base = serde_json::to_value(&self.config)?;
        merge_values(&mut base, layer);
        self.config = serde_json::from_value(base)?;
        Ok(())
    }

    fn apply_env_overrides<I>(&mut self, prefix: &str, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = format!("{prefix}__");
        let mut matching: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(key, _)| key.starts_with(&marker))
            .collect();
        // Deterministic order when the same key appears twice.
        matching.sort();

        for (key, value) in matching {
            self.apply_env_var(&key, &value, &marker)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, marker: &str) -> Result<(), ConfigError> {
        let path = key
            .strip_prefix(marker)
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;
        let parts: Vec<&str> = path.split("__").collect();

        let telemetry = &mut self.config.telemetry;
        let pipeline = &mut self.config.pipeline;

        match parts.as_slice() {
            ["TELEMETRY", "SERVICE_NAME"] => telemetry.service_name = value.to_string(),
            ["TELEMETRY", "SERVICE_VERSION"] => {
                telemetry.service_version = non_empty(value);
            }
            ["TELEMETRY", "ENVIRONMENT"] => telemetry.environment = value.to_string(),

            ["TELEMETRY", "METRICS", "ENABLED"] => {
                telemetry.metrics.enabled = parse_bool(key, value)?;
            }
            ["TELEMETRY", "METRICS", "DURATION_BUCKETS"] => {
                telemetry.metrics.duration_buckets = parse_buckets(key, value)?;
            }

            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                telemetry.logging.enabled = parse_bool(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => telemetry.logging.level = value.to_string(),
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                telemetry.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
                telemetry.logging.include_location = parse_bool(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "THREAD_IDS"] => {
                telemetry.logging.thread_ids = parse_bool(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "SPAN_EVENTS"] => {
                telemetry.logging.span_events = parse_bool(key, value)?;
            }

            ["PIPELINE", "LOG_DIRECTORY"] => pipeline.log_directory = PathBuf::from(value),
            ["PIPELINE", "TRUST_INCOMING_REQUEST_ID"] => {
                pipeline.trust_incoming_request_id = parse_bool(key, value)?;
            }

            _ => {
                return Err(ConfigError::env_parse_error(
                    key,
                    "unknown configuration key",
                ))
            }
        }

        Ok(())
    }
}

fn parse_layer(content: &str, format: &str) -> Result<Value, ConfigError> {
    match format {
        "toml" => {
            let table: toml::Table = toml::from_str(content)?;
            Ok(serde_json::to_value(table)?)
        }
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::unsupported_format(other)),
    }
}

/// Deep-merges `layer` into `base`. Objects merge key by key, anything else
/// replaces.
fn merge_values(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                merge_values(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, layer) => *base = layer,
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}

fn parse_buckets(key: &str, value: &str) -> Result<Vec<f64>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>().map_err(|_| {
                ConfigError::env_parse_error(key, "expected comma-separated numbers")
            })
        })
        .collect()
}
