//! Error translation boundary.
//!
//! The outermost stage. It runs the rest of the chain and is the only place
//! a fault is ever caught, whether it arrives as `Err(Fault)` or as a panic.
//! Every caught fault is:
//!
//! 1. logged once at `ERROR` with the request's correlation fields
//! 2. counted in `herald_faults_total{kind,status}`
//! 3. classified and written as a JSON envelope
//!
//! The boundary itself never fails. If the envelope cannot be encoded the
//! client gets a plain-text `500` instead.
//!
//! ```text
//! [ErrorTranslation] → RequestTagging → AuthOutcomeRewrite → … → Handler
//! ```

use crate::context::MiddlewareContext;
use crate::middleware::Next;
use crate::types::{Request, Response, ResponseExt, REQUEST_ID_HEADER};
use bytes::Bytes;
use futures_util::FutureExt;
use herald_core::{classify, Fault, FaultKind, ResponseEnvelope, UNEXPECTED_ERROR_MESSAGE};
use herald_telemetry::metrics;
use http::header::HeaderValue;
use http::StatusCode;
use std::error::Error as _;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Encodes envelopes into response bodies.
pub trait EnvelopeEncoder: Send + Sync + 'static {
    /// Encodes `envelope`.
    fn encode(&self, envelope: &ResponseEnvelope) -> Result<Bytes, serde_json::Error>;
}

/// The default encoder, `serde_json` in wire field order.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEnvelopeEncoder;

impl EnvelopeEncoder for JsonEnvelopeEncoder {
    fn encode(&self, envelope: &ResponseEnvelope) -> Result<Bytes, serde_json::Error> {
        envelope.to_json_bytes().map(Bytes::from)
    }
}

/// What the boundary translated, stored in the context.
///
/// Absent when the request completed without a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedFault {
    /// Kind of the caught fault.
    pub kind: FaultKind,
    /// Status written to the client.
    pub status: StatusCode,
    /// Message written to the client.
    pub client_message: String,
    /// Whether the fault arrived as a panic.
    pub from_panic: bool,
}

/// The single protective boundary around the pipeline.
#[derive(Clone)]
pub struct ErrorTranslationStage {
    encoder: Arc<dyn EnvelopeEncoder>,
}

impl ErrorTranslationStage {
    /// Creates the stage with the JSON encoder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            encoder: Arc::new(JsonEnvelopeEncoder),
        }
    }

    /// Replaces the envelope encoder.
    #[must_use]
    pub fn with_encoder<E: EnvelopeEncoder>(mut self, encoder: E) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    /// Returns the stage name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        "error_translation"
    }

    /// Runs `next` and turns whatever comes back into a response.
    pub async fn guard(
        &self,
        ctx: &mut MiddlewareContext,
        request: Request,
        next: Next<'_>,
    ) -> Response {
        let outcome = AssertUnwindSafe(next.run(ctx, request))
            .catch_unwind()
            .await;

        let mut response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(fault)) => self.translate(ctx, &fault, false),
            Err(payload) => self.translate(ctx, &Fault::from_panic(payload), true),
        };

        if let Ok(value) = HeaderValue::from_str(&ctx.request_id().to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        let status = response.status();
        ctx.set_response_status(status);
        metrics::record_request(status, ctx.elapsed());

        response
    }

    fn translate(&self, ctx: &mut MiddlewareContext, fault: &Fault, from_panic: bool) -> Response {
        let classification = classify(fault);
        let kind = fault.kind();
        let status = classification.status;

        if ctx.body_written() {
            tracing::warn!(
                request_id = %ctx.request_id(),
                fault_kind = kind.as_str(),
                "Response body already written before the fault; replacing it with the envelope"
            );
        }

        tracing::error!(
            request_id = %ctx.request_id(),
            correlation_id = %ctx.correlation_id(),
            log_target = ctx.log_target_name(),
            fault_kind = kind.as_str(),
            http.status_code = status.as_u16(),
            panic = from_panic,
            error = %ErrorChain(fault),
            "Request failed"
        );

        metrics::record_fault(kind, status);

        let client_message = classification.message.clone();
        let envelope = ResponseEnvelope::from(classification);

        let response = match self.encoder.encode(&envelope) {
            Ok(body) => Response::json_bytes(status, body),
            Err(err) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    error = %err,
                    "Failed to encode error envelope; sending plain-text fallback"
                );
                Response::plain_text(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_ERROR_MESSAGE)
            }
        };

        ctx.mark_body_written();
        ctx.set_extension(TranslatedFault {
            kind,
            status: response.status(),
            client_message,
            from_panic,
        });

        response
    }
}

impl Default for ErrorTranslationStage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorTranslationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorTranslationStage").finish_non_exhaustive()
    }
}

/// Formats an error followed by its source chain, `outer: inner: root`.
///
/// A first source whose text is already the fault's message is skipped.
struct ErrorChain<'a>(&'a Fault);

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        if source.is_some_and(|err| err.to_string() == self.0.message()) {
            source = source.and_then(std::error::Error::source);
        }
        while let Some(err) = source {
            write!(f, ": {err}")?;
            source = err.source();
        }
        Ok(())
    }
}
