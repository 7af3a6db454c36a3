//! Core middleware trait and types.
//!
//! Inner stages implement [`Middleware`] and return a [`MiddlewareResult`]:
//! a fault raised anywhere below is passed upstream untouched with `?` and
//! only the error translation boundary turns it into a response.
//!
//! # Example
//!
//! ```
//! use herald_middleware::{BoxFuture, Middleware, MiddlewareContext, MiddlewareResult, Next, Request};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut MiddlewareContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, MiddlewareResult> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await?;
//!             tracing::debug!(elapsed_ms = ctx.elapsed().as_millis() as u64, "inner chain done");
//!             Ok(response)
//!         })
//!     }
//! }
//! ```

use crate::context::MiddlewareContext;
use crate::types::{MiddlewareResult, Request};
use std::future::Future;
use std::pin::Pin;

/// A boxed future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The terminal handler a pipeline invokes.
pub type Handler<'a> =
    Box<dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, MiddlewareResult> + Send + 'a>;

/// An inner pipeline stage.
///
/// # Invariants
///
/// - A stage calls `next.run()` at most once
/// - A stage never swallows a fault from downstream; it returns it with `?`
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this stage, used in logs and
    /// [`Pipeline::stage_names`](crate::Pipeline::stage_names).
    fn name(&self) -> &'static str;

    /// Processes the request, usually by delegating to `next`.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult>;
}

/// Callback to invoke the rest of the chain.
///
/// Consumed by [`Next::run`], so it can only be called once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(Handler<'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that invokes `middleware`, then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, MiddlewareResult>
            + Send
            + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next stage or the handler.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> MiddlewareResult {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}
