//! # Herald Core
//!
//! Core types for the Herald request pipeline.
//!
//! This crate provides the pieces that carry no I/O:
//!
//! - [`Fault`] / [`FaultKind`] - The closed set of failures handlers can raise
//! - [`classify`] - Maps a fault to its wire status, message and payload
//! - [`ResponseEnvelope`] - The uniform JSON body every error response uses
//! - [`Principal`] / [`CorrelationId`] - Who a request's log entries belong to
//! - [`LogTarget`] - The per-request log target name
//! - [`RequestId`] - UUID v7 request identifier

#![doc(html_root_url = "https://docs.rs/herald-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod classifier;
mod envelope;
mod error;
mod identity;
mod log_target;
mod request_id;

pub use classifier::{classify, Classification, DATABASE_ERROR_MESSAGE, UNEXPECTED_ERROR_MESSAGE};
pub use envelope::{ResponseEnvelope, FORBIDDEN_MESSAGE, UNAUTHORIZED_MESSAGE};
pub use error::{Fault, FaultKind, FaultResult};
pub use identity::{CorrelationId, Principal, UNKNOWN_IDENTITY};
pub use log_target::{LogTarget, DEFAULT_LOG_DIRECTORY, LOG_FILE_EXTENSION};
pub use request_id::RequestId;
