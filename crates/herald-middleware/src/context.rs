//! Per-request pipeline state.
//!
//! A [`MiddlewareContext`] is created for each request, passed by `&mut`
//! through every stage, and dropped once the response has been produced.
//! It is never shared between requests.

use herald_core::{CorrelationId, LogTarget, RequestId};
use http::StatusCode;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// State that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use herald_middleware::MiddlewareContext;
///
/// let ctx = MiddlewareContext::new();
/// assert!(ctx.correlation_id().is_unknown());
/// assert!(ctx.log_target().is_none());
/// assert!(!ctx.body_written());
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,

    /// Who this request's log entries are attributed to.
    correlation_id: CorrelationId,

    /// Set by the request tagging stage.
    log_target: Option<LogTarget>,

    /// Whether some stage or handler has already committed a body.
    body_written: bool,

    /// The status of the response that left the pipeline.
    response_status: Option<StatusCode>,

    started_at: Instant,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a new context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            correlation_id: CorrelationId::unknown(),
            log_target: None,
            body_written: false,
            response_status: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Replaces the request ID.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the correlation identity, `"Unknown"` until tagged.
    #[must_use]
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Sets the correlation identity.
    pub fn set_correlation_id(&mut self, correlation_id: CorrelationId) {
        self.correlation_id = correlation_id;
    }

    /// Returns the log target, if the request has been tagged.
    #[must_use]
    pub fn log_target(&self) -> Option<&LogTarget> {
        self.log_target.as_ref()
    }

    /// Returns the log target name, or an empty string before tagging.
    #[must_use]
    pub fn log_target_name(&self) -> &str {
        self.log_target.as_ref().map_or("", LogTarget::name)
    }

    /// Sets the log target.
    pub fn set_log_target(&mut self, log_target: LogTarget) {
        self.log_target = Some(log_target);
    }

    /// Returns `true` once a response body has been committed.
    #[must_use]
    pub fn body_written(&self) -> bool {
        self.body_written
    }

    /// Records that a response body has been committed.
    ///
    /// Handlers that stream or otherwise commit output early should call
    /// this so later stages leave the response alone.
    pub fn mark_body_written(&mut self) {
        self.body_written = true;
    }

    /// Returns the status of the response that left the pipeline.
    #[must_use]
    pub fn response_status(&self) -> Option<StatusCode> {
        self.response_status
    }

    pub(crate) fn set_response_status(&mut self, status: StatusCode) {
        self.response_status = Some(status);
    }

    /// Returns when the request entered the pipeline.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request entered the pipeline.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    ///
    /// # Example
    ///
    /// ```
    /// use herald_middleware::MiddlewareContext;
    ///
    /// struct TenantId(String);
    ///
    /// let mut ctx = MiddlewareContext::new();
    /// ctx.set_extension(TenantId("acme".to_string()));
    ///
    /// assert_eq!(ctx.get_extension::<TenantId>().unwrap().0, "acme");
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use herald_core::Principal;

    #[test]
    fn test_new_context_defaults() {
        let ctx = MiddlewareContext::new();
        assert_eq!(ctx.correlation_id().as_str(), "Unknown");
        assert_eq!(ctx.log_target_name(), "");
        assert!(!ctx.body_written());
        assert!(ctx.response_status().is_none());
    }

    #[test]
    fn test_contexts_get_distinct_request_ids() {
        let a = MiddlewareContext::new();
        let b = MiddlewareContext::new();
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn test_tagging_fields() {
        let mut ctx = MiddlewareContext::new();
        let identity = CorrelationId::from_principal(Some(&Principal::new("u-5")));
        let target = LogTarget::new(&identity, Utc::now(), "Logs");

        ctx.set_correlation_id(identity);
        ctx.set_log_target(target.clone());

        assert_eq!(ctx.correlation_id().as_str(), "u-5");
        assert_eq!(ctx.log_target(), Some(&target));
        assert!(ctx.log_target_name().starts_with("request_u-5_"));
    }

    #[test]
    fn test_body_written_flag() {
        let mut ctx = MiddlewareContext::new();
        ctx.mark_body_written();
        assert!(ctx.body_written());
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, Clone, PartialEq)]
        struct Attempt(u32);

        let mut ctx = MiddlewareContext::new();
        assert!(!ctx.has_extension::<Attempt>());

        ctx.set_extension(Attempt(2));
        assert_eq!(ctx.get_extension::<Attempt>(), Some(&Attempt(2)));

        assert_eq!(ctx.remove_extension::<Attempt>(), Some(Attempt(2)));
        assert!(!ctx.has_extension::<Attempt>());
    }

    #[test]
    fn test_elapsed_time() {
        let ctx = MiddlewareContext::new();
        std::thread::sleep(Duration::from_millis(5));
        assert!(ctx.elapsed() >= Duration::from_millis(5));
    }
}
