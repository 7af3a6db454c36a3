//! Fixed-order middleware pipeline.
//!
//! Every request flows through the same chain:
//!
//! 1. **Error Translation** - The protective boundary (outermost)
//! 2. **Request Tagging** - Correlation identity and log target
//! 3. **Auth Outcome Rewrite** - Envelopes for bare 401/403 responses
//!
//! Extra inner stages may be appended after these three. They always run
//! inside the core stages and can never wrap them.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::{AuthOutcomeRewriteStage, ErrorTranslationStage, RequestTaggingStage};
use crate::types::{MiddlewareResult, Request, Response};
use std::sync::Arc;

/// A type-erased inner stage.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The fixed-order middleware pipeline.
///
/// A pipeline is immutable once built and is shared across requests,
/// typically behind an `Arc`.
///
/// # Example
///
/// ```
/// use herald_middleware::Pipeline;
///
/// let pipeline = Pipeline::standard();
/// assert_eq!(
///     pipeline.stage_names(),
///     vec!["error_translation", "request_tagging", "auth_outcome_rewrite"]
/// );
/// ```
#[derive(Clone)]
pub struct Pipeline {
    error_translation: ErrorTranslationStage,

    /// Request tagging, auth rewrite, then any extra inner stages.
    inner_stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Creates the pipeline with every core stage at its defaults.
    #[must_use]
    pub fn standard() -> Self {
        PipelineBuilder::new().build()
    }

    /// Processes a request with a fresh context.
    ///
    /// Always produces a response.
    pub async fn process<H>(&self, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, MiddlewareResult>
            + Send
            + 'static,
    {
        let mut ctx = MiddlewareContext::new();
        self.process_with_context(&mut ctx, request, handler).await
    }

    /// Processes a request with a caller-owned context.
    ///
    /// Use this to inspect the context (correlation identity, log target,
    /// translated fault) after the response has been produced.
    pub async fn process_with_context<'a, H>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, MiddlewareResult>
            + Send
            + 'a,
    {
        let next = self.build_chain(handler);
        self.error_translation.guard(ctx, request, next).await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, MiddlewareResult>
            + Send
            + 'a,
    {
        let mut next = Next::handler(handler);

        for middleware in self.inner_stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }

        next
    }

    /// Returns the names of all stages, outermost first.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        std::iter::once(self.error_translation.name())
            .chain(self.inner_stages.iter().map(|mw| mw.name()))
            .collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        1 + self.inner_stages.len()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
///
/// Each core stage can be configured, but not removed or reordered.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    error_translation: ErrorTranslationStage,
    request_tagging: RequestTaggingStage,
    auth_outcome_rewrite: AuthOutcomeRewriteStage,
    extra_stages: Vec<NamedStage>,
}

struct NamedStage(BoxedMiddleware);

impl std::fmt::Debug for NamedStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.name())
    }
}

impl PipelineBuilder {
    /// Creates a builder with every core stage at its defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the error translation boundary.
    #[must_use]
    pub fn error_translation(mut self, stage: ErrorTranslationStage) -> Self {
        self.error_translation = stage;
        self
    }

    /// Configures request tagging.
    #[must_use]
    pub fn request_tagging(mut self, stage: RequestTaggingStage) -> Self {
        self.request_tagging = stage;
        self
    }

    /// Configures the auth outcome rewrite.
    #[must_use]
    pub fn auth_outcome_rewrite(mut self, stage: AuthOutcomeRewriteStage) -> Self {
        self.auth_outcome_rewrite = stage;
        self
    }

    /// Appends an inner stage that runs after the core stages, before the
    /// handler.
    ///
    /// Faults it returns are translated like any other.
    #[must_use]
    pub fn add_inner_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.extra_stages.push(NamedStage(Arc::new(middleware)));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        let mut inner_stages: Vec<BoxedMiddleware> = Vec::with_capacity(2 + self.extra_stages.len());
        inner_stages.push(Arc::new(self.request_tagging));
        inner_stages.push(Arc::new(self.auth_outcome_rewrite));
        inner_stages.extend(self.extra_stages.into_iter().map(|stage| stage.0));

        Pipeline {
            error_translation: self.error_translation,
            inner_stages,
        }
    }
}

/// The core stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: the protective boundary
    ErrorTranslation = 1,
    /// Stage 2: correlation identity and log target
    RequestTagging = 2,
    /// Stage 3: 401/403 envelopes
    AuthOutcomeRewrite = 3,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ErrorTranslation => "error_translation",
            Self::RequestTagging => "request_tagging",
            Self::AuthOutcomeRewrite => "auth_outcome_rewrite",
        }
    }

    /// Returns `true` for the stage that catches faults.
    #[must_use]
    pub const fn is_boundary(self) -> bool {
        matches!(self, Self::ErrorTranslation)
    }

    /// Returns all core stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 3] {
        [
            Self::ErrorTranslation,
            Self::RequestTagging,
            Self::AuthOutcomeRewrite,
        ]
    }
}
