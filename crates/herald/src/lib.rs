//! # Herald
//!
//! **Uniform JSON failure envelopes for HTTP request pipelines**
//!
//! Every failure a request can hit, from a business rule violation to a
//! panicking handler or a bare `401`, reaches the client as the same
//! envelope:
//!
//! ```json
//! {"statusCode":404,"statusMessage":"Order 7 was not found","isSuccess":false,"totalCount":0,"data":null}
//! ```
//!
//! Each fault is logged exactly once, tagged with the caller's identity and
//! a per-request log target.
//!
//! ## Quick Start
//!
//! ```no_run
//! use herald::prelude::*;
//!
//! # async fn run() -> Result<(), herald::HeraldError> {
//! let config = ConfigLoader::new()
//!     .with_production()
//!     .with_optional_file("herald.toml")?
//!     .with_env()
//!     .load()?;
//!
//! let pipeline = herald::init(&config)?;
//!
//! # let request: Request = http::Request::new(http_body_util::Full::new(bytes::Bytes::new()));
//! let response = pipeline
//!     .process(request, |_ctx, _req| {
//!         Box::pin(async { Err(Fault::not_found("Order 7 was not found")) })
//!     })
//!     .await;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → ErrorTranslation → RequestTagging → AuthOutcomeRewrite → Handler
//!                  ↑                                                    │
//! Response ←───────┴─────────── Ok / Err(Fault) / panic ────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/herald/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error;

pub use herald_config as config;
pub use herald_core as core;
pub use herald_middleware as middleware;
pub use herald_telemetry as telemetry;

use herald_config::{ConfigError, HeraldConfig};
use herald_middleware::{Pipeline, RequestTaggingStage};
use herald_telemetry::TelemetryError;

/// Errors raised while bootstrapping Herald.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging or metrics could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Builds the standard pipeline from the `[pipeline]` section.
#[must_use]
pub fn build_pipeline(config: &HeraldConfig) -> Pipeline {
    let tagging = RequestTaggingStage::new()
        .with_log_directory(config.pipeline.log_directory.clone())
        .trust_incoming_request_id(config.pipeline.trust_incoming_request_id);

    Pipeline::builder().request_tagging(tagging).build()
}

/// Installs the global logging subscriber and metrics recorder from the
/// `[telemetry]` section.
///
/// Call once per process.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem is already installed or its
/// settings are invalid.
pub fn init_telemetry(config: &HeraldConfig) -> Result<(), TelemetryError> {
    herald_telemetry::init_telemetry(&config.telemetry.to_telemetry_config())
}

/// Validates the configuration, initializes telemetry, and builds the
/// pipeline.
///
/// # Errors
///
/// Returns `HeraldError` if validation or telemetry initialization fails.
pub fn init(config: &HeraldConfig) -> Result<Pipeline, HeraldError> {
    config.validate()?;
    init_telemetry(config)?;

    Ok(build_pipeline(config))
}

/// Prelude module for convenient imports.
///
/// ```
/// use herald::prelude::*;
///
/// let pipeline = Pipeline::standard();
/// assert_eq!(pipeline.stage_count(), 3);
/// ```
pub mod prelude {
    pub use herald_core::{
        classify, Classification, CorrelationId, Fault, FaultKind, FaultResult, LogTarget,
        Principal, RequestId, ResponseEnvelope,
    };

    pub use herald_middleware::{
        BoxFuture, Middleware, MiddlewareContext, MiddlewareResult, Next, Pipeline,
        PipelineBuilder, Request, Response, ResponseExt,
    };

    pub use herald_config::{ConfigLoader, HeraldConfig};

    pub use herald_telemetry::render_metrics;
}
