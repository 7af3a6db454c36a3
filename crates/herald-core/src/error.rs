//! Fault types raised by code downstream of the pipeline.
//!
//! A [`Fault`] is the single error type handlers and stages return when a
//! request cannot complete normally. It is a closed enumeration: every kind of
//! failure the pipeline knows how to surface has its own variant, and each
//! variant carries only the data needed to render its message and payload.
//!
//! | Kind               | Typical source                          |
//! |--------------------|-----------------------------------------|
//! | `BusinessRule`     | A domain rule rejected the request      |
//! | `NotFound`         | A requested resource does not exist     |
//! | `InvalidArgument`  | An input value is malformed             |
//! | `DataAccess`       | The persistence layer failed            |
//! | `Unexpected`       | Anything else, including panics         |
//!
//! How a fault maps onto the wire is decided by [`crate::classify`].

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::any::Any;
use thiserror::Error;

/// Result type alias using [`Fault`].
pub type FaultResult<T> = Result<T, Fault>;

/// The kind tag of a [`Fault`].
///
/// Kinds are listed in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// A business rule was violated.
    BusinessRule,
    /// A requested resource was not found.
    NotFound,
    /// An argument supplied by the client was invalid.
    InvalidArgument,
    /// The persistence layer failed.
    DataAccess,
    /// Any fault not otherwise recognized.
    Unexpected,
}

impl FaultKind {
    /// All kinds, in classification priority order.
    pub const ALL: [FaultKind; 5] = [
        Self::BusinessRule,
        Self::NotFound,
        Self::InvalidArgument,
        Self::DataAccess,
        Self::Unexpected,
    ];

    /// Returns the HTTP status this kind is surfaced with.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::BusinessRule | Self::InvalidArgument => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::DataAccess | Self::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BusinessRule => "business_rule",
            Self::NotFound => "not_found",
            Self::InvalidArgument => "invalid_argument",
            Self::DataAccess => "data_access",
            Self::Unexpected => "unexpected",
        }
    }

    /// Returns `true` if the client caused this fault.
    #[must_use]
    pub const fn is_client_fault(self) -> bool {
        matches!(
            self,
            Self::BusinessRule | Self::NotFound | Self::InvalidArgument
        )
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure raised while handling a request.
///
/// # Example
///
/// ```
/// use herald_core::{Fault, FaultKind};
///
/// fn find_order(id: u64) -> Result<String, Fault> {
///     Err(Fault::not_found(format!("Order {id} was not found")))
/// }
///
/// let fault = find_order(7).unwrap_err();
/// assert_eq!(fault.kind(), FaultKind::NotFound);
/// assert_eq!(fault.to_string(), "Order 7 was not found");
/// ```
#[derive(Error, Debug)]
pub enum Fault {
    /// A business rule rejected the request.
    #[error("{message}")]
    BusinessRule {
        /// Client-facing message.
        message: String,
        /// Structured details surfaced as the envelope's `data`.
        details: serde_json::Value,
    },

    /// The requested resource does not exist.
    #[error("{message}")]
    NotFound {
        /// Client-facing message.
        message: String,
        /// The lookup failure that caused this, if any.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// An argument was malformed or out of range.
    #[error("{message}")]
    InvalidArgument {
        /// Client-facing message.
        message: String,
        /// Name of the offending parameter.
        param: Option<String>,
    },

    /// The persistence layer failed.
    ///
    /// The message is logged but never sent to clients.
    #[error("Data access failure: {message}")]
    DataAccess {
        /// Internal description of the failure.
        message: String,
        /// The underlying driver error.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A failure the pipeline does not recognize.
    ///
    /// The message is logged but never sent to clients.
    #[error("Unexpected failure: {message}")]
    Unexpected {
        /// Internal description of the failure.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl Fault {
    /// Creates a business rule fault with structured details.
    #[must_use]
    pub fn business_rule(message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::BusinessRule {
            message: message.into(),
            details,
        }
    }

    /// Creates a business rule fault from any serializable details value.
    pub fn try_business_rule<T: Serialize>(
        message: impl Into<String>,
        details: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::business_rule(message, serde_json::to_value(details)?))
    }

    /// Creates a not found fault.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a not found fault that wraps the lookup failure.
    pub fn not_found_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::NotFound {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an invalid argument fault.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            param: None,
        }
    }

    /// Creates an invalid argument fault naming the offending parameter.
    #[must_use]
    pub fn invalid_param(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            param: Some(param.into()),
        }
    }

    /// Creates a data access fault from a driver error.
    pub fn data_access(source: impl Into<anyhow::Error>) -> Self {
        let source = source.into();
        Self::DataAccess {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a data access fault with only a description.
    #[must_use]
    pub fn data_access_message(message: impl Into<String>) -> Self {
        Self::DataAccess {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps any error as an unexpected fault.
    pub fn unexpected(source: impl Into<anyhow::Error>) -> Self {
        let source = source.into();
        Self::Unexpected {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates an unexpected fault with only a description.
    #[must_use]
    pub fn unexpected_message(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
            source: None,
        }
    }

    /// Converts a caught panic payload into an unexpected fault.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };

        Self::unexpected_message(format!("panic: {detail}"))
    }

    /// Returns the kind tag of this fault.
    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        match self {
            Self::BusinessRule { .. } => FaultKind::BusinessRule,
            Self::NotFound { .. } => FaultKind::NotFound,
            Self::InvalidArgument { .. } => FaultKind::InvalidArgument,
            Self::DataAccess { .. } => FaultKind::DataAccess,
            Self::Unexpected { .. } => FaultKind::Unexpected,
        }
    }

    /// Returns the fault's own message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::BusinessRule { message, .. }
            | Self::NotFound { message, .. }
            | Self::InvalidArgument { message, .. }
            | Self::DataAccess { message, .. }
            | Self::Unexpected { message, .. } => message,
        }
    }

    /// Returns the HTTP status code for this fault.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind().status()
    }
}

impl From<anyhow::Error> for Fault {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err)
    }
}
