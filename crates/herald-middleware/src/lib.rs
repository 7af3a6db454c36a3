//! # Herald Middleware
//!
//! The fixed-order request pipeline that makes every failure look the same
//! to clients.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → ErrorTranslation → RequestTagging → AuthOutcomeRewrite → [extra] → Handler
//!                 ↑                                                              │
//! Response ←──────┴──────────── Ok(Response) / Err(Fault) / panic ───────────────┘
//! ```
//!
//! | Stage | Middleware           | Purpose                                         |
//! |-------|----------------------|-------------------------------------------------|
//! | 1     | Error Translation    | Catch faults and panics, write the JSON envelope |
//! | 2     | Request Tagging      | Correlation identity, log target, request span  |
//! | 3     | Auth Outcome Rewrite | Envelopes for empty 401/403 responses           |
//!
//! Handlers return `Result<Response, Fault>`. Inner stages pass faults
//! upstream with `?`; only stage 1 turns them into responses, so each fault
//! is logged exactly once.
//!
//! ## Example
//!
//! ```
//! use bytes::Bytes;
//! use herald_core::Fault;
//! use herald_middleware::{Pipeline, Request};
//! use http::StatusCode;
//! use http_body_util::Full;
//!
//! # tokio_test::block_on(async {
//! let pipeline = Pipeline::standard();
//! let request: Request = http::Request::new(Full::new(Bytes::new()));
//!
//! let response = pipeline
//!     .process(request, |_ctx, _req| {
//!         Box::pin(async { Err(Fault::not_found("Order 7 was not found")) })
//!     })
//!     .await;
//!
//! assert_eq!(response.status(), StatusCode::NOT_FOUND);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/herald-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Handler, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use stages::{
    AuthOutcomeRewriteStage, EnvelopeEncoder, ErrorTranslationStage, JsonEnvelopeEncoder,
    RequestTaggingStage, TranslatedFault,
};
pub use types::{
    MiddlewareResult, Request, Response, ResponseExt, JSON_CONTENT_TYPE, PLAIN_TEXT_CONTENT_TYPE,
    REQUEST_ID_HEADER,
};
