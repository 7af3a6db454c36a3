//! Authentication outcome rewriting.
//!
//! Authentication and authorization layers reject callers by setting a bare
//! `401` or `403` status. This stage gives those responses the same envelope
//! every other error gets:
//!
//! | Status | `statusMessage`  |
//! |--------|------------------|
//! | 401    | `Unauthorized`   |
//! | 403    | `Forbidden`      |
//!
//! A response that already has a body is left alone, as is any response
//! after a stage or handler has marked the body as written. Faults from the
//! inner chain pass straight through to the error translation boundary.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{replace_body, MiddlewareResult, Request, Response, ResponseExt, JSON_CONTENT_TYPE};
use bytes::Bytes;
use herald_core::ResponseEnvelope;
use herald_telemetry::metrics;
use http::StatusCode;

/// Rewrites empty `401`/`403` responses into envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthOutcomeRewriteStage;

impl AuthOutcomeRewriteStage {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn rewrite(ctx: &mut MiddlewareContext, response: Response) -> Response {
        let envelope = match response.status() {
            StatusCode::UNAUTHORIZED => ResponseEnvelope::unauthorized(),
            StatusCode::FORBIDDEN => ResponseEnvelope::forbidden(),
            _ => return response,
        };
        let status = response.status();

        if response.has_body() || ctx.body_written() {
            tracing::debug!(
                request_id = %ctx.request_id(),
                http.status_code = status.as_u16(),
                "Response body already present; leaving auth outcome as is"
            );
            return response;
        }

        let body = match envelope.to_json_bytes() {
            Ok(body) => Bytes::from(body),
            Err(err) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    error = %err,
                    "Failed to encode auth outcome envelope"
                );
                return response;
            }
        };

        metrics::record_auth_rewrite(status);
        tracing::debug!(
            request_id = %ctx.request_id(),
            correlation_id = %ctx.correlation_id(),
            http.status_code = status.as_u16(),
            "Rewrote auth outcome into envelope"
        );

        ctx.mark_body_written();
        replace_body(response, body, JSON_CONTENT_TYPE)
    }
}

impl Middleware for AuthOutcomeRewriteStage {
    fn name(&self) -> &'static str {
        "auth_outcome_rewrite"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            let response = next.run(ctx, request).await?;
            Ok(Self::rewrite(ctx, response))
        })
    }
}
