//! Request tagging.
//!
//! Derives who a request's log entries belong to and where they go, then
//! runs the rest of the chain inside a `request` span carrying those fields.
//!
//! ## Correlation identity
//!
//! The authentication layer (outside the pipeline) attaches a
//! [`Principal`] to the request extensions when it recognizes the caller.
//! Its ID becomes the correlation identity; without one the identity is
//! `"Unknown"`.
//!
//! ## Log target
//!
//! `request_{identity}_{yyyyMMdd_HHmmssfff}` in UTC, placed under the
//! configured log directory (`Logs` by default).
//!
//! ## Request ID
//!
//! Incoming `X-Request-ID` headers are ignored unless the stage is told to
//! trust them, as with internal service-to-service traffic.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{MiddlewareResult, Request, REQUEST_ID_HEADER};
use chrono::Utc;
use herald_core::{CorrelationId, LogTarget, Principal, RequestId, DEFAULT_LOG_DIRECTORY};
use std::path::{Path, PathBuf};
use tracing::Instrument;

/// Tags each request with its correlation identity and log target.
///
/// # Example
///
/// ```
/// use herald_middleware::stages::RequestTaggingStage;
///
/// let stage = RequestTaggingStage::new()
///     .with_log_directory("/var/log/orders")
///     .trust_incoming_request_id(true);
/// assert_eq!(stage.log_directory().to_str(), Some("/var/log/orders"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestTaggingStage {
    log_directory: PathBuf,
    trust_incoming_request_id: bool,
}

impl RequestTaggingStage {
    /// Creates the stage with the default log directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            log_directory: PathBuf::from(DEFAULT_LOG_DIRECTORY),
            trust_incoming_request_id: false,
        }
    }

    /// Sets the directory log targets are placed under.
    #[must_use]
    pub fn with_log_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.log_directory = directory.into();
        self
    }

    /// Sets whether a valid incoming `X-Request-ID` replaces the generated ID.
    #[must_use]
    pub fn trust_incoming_request_id(mut self, trust: bool) -> Self {
        self.trust_incoming_request_id = trust;
        self
    }

    /// Returns the log directory.
    #[must_use]
    pub fn log_directory(&self) -> &Path {
        &self.log_directory
    }

    fn incoming_request_id(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming_request_id {
            return None;
        }

        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(RequestId::parse)
    }
}

impl Default for RequestTaggingStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for RequestTaggingStage {
    fn name(&self) -> &'static str {
        "request_tagging"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            if let Some(request_id) = self.incoming_request_id(&request) {
                ctx.set_request_id(request_id);
            }

            let correlation_id =
                CorrelationId::from_principal(request.extensions().get::<Principal>());
            let log_target = LogTarget::new(&correlation_id, Utc::now(), &self.log_directory);

            let span = tracing::info_span!(
                "request",
                request_id = %ctx.request_id(),
                correlation_id = %correlation_id,
                log_target = %log_target,
                http.method = %request.method(),
                http.path = %request.uri().path()
            );

            ctx.set_correlation_id(correlation_id);
            ctx.set_log_target(log_target);

            tracing::debug!(parent: &span, "Request tagged");

            next.run(ctx, request).instrument(span).await
        })
    }
}
