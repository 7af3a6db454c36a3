//! Typed configuration for Herald.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides (`HERALD__SECTION__KEY`)
//! - Strict parsing (unknown fields are errors)
//! - Layered loading (defaults → files → env)
//!
//! [`HeraldConfig`] has two sections:
//!
//! - [`TelemetrySection`] - service identity, logging, metrics
//! - [`PipelineSection`] - log target directory and request id handling
//!
//! # Example
//!
//! ```no_run
//! use herald_config::ConfigLoader;
//!
//! # fn main() -> Result<(), herald_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_production()
//!     .with_optional_file("herald.toml")?
//!     .with_dotenv()?
//!     .with_env()
//!     .load()?;
//!
//! println!("Request logs go to {}", config.pipeline.log_directory.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [telemetry]
//! service_name = "orders"
//! service_version = "1.4.0"
//! environment = "production"
//!
//! [telemetry.metrics]
//! enabled = true
//! duration_buckets = [0.005, 0.05, 0.5, 5.0]
//!
//! [telemetry.logging]
//! level = "info,herald_middleware=debug"
//! format = "json"
//!
//! [pipeline]
//! log_directory = "/var/log/orders"
//! trust_incoming_request_id = false
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{HeraldConfig, HeraldConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{LogFormat, LoggingSection, MetricsSection, PipelineSection, TelemetrySection};
