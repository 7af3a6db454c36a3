//! Fault classification.
//!
//! [`classify`] maps a [`Fault`] to the status, message and payload that go on
//! the wire. The mapping is a closed table evaluated in priority order:
//!
//! | Kind              | Status | Message                         | Data             |
//! |-------------------|--------|---------------------------------|------------------|
//! | `BusinessRule`    | 400    | the fault's own message         | attached details |
//! | `NotFound`        | 404    | the fault's own message         | none             |
//! | `InvalidArgument` | 400    | the fault's own message         | none             |
//! | `DataAccess`      | 500    | [`DATABASE_ERROR_MESSAGE`]      | none             |
//! | `Unexpected`      | 500    | [`UNEXPECTED_ERROR_MESSAGE`]    | none             |
//!
//! Server-side faults never expose their own message.
//!
//! "None" is written as `"data": null`, never as an empty object `{}`. Clients
//! tell a payload-less fault from a business rule with empty details by that
//! difference alone.

use crate::error::Fault;
use http::StatusCode;

/// Client-facing message for persistence failures.
pub const DATABASE_ERROR_MESSAGE: &str = "A database error occurred.";

/// Client-facing message for unrecognized failures.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// The wire-level outcome of a fault.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// HTTP status to respond with.
    pub status: StatusCode,
    /// Client-facing summary.
    pub message: String,
    /// Detail payload, if the fault kind carries one.
    pub data: Option<serde_json::Value>,
}

/// Classifies a fault.
///
/// Deterministic and side-effect free.
///
/// # Example
///
/// ```
/// use herald_core::{classify, Fault, DATABASE_ERROR_MESSAGE};
/// use http::StatusCode;
///
/// let c = classify(&Fault::data_access_message("deadlock on orders"));
/// assert_eq!(c.status, StatusCode::INTERNAL_SERVER_ERROR);
/// assert_eq!(c.message, DATABASE_ERROR_MESSAGE);
/// assert!(c.data.is_none());
/// ```
#[must_use]
pub fn classify(fault: &Fault) -> Classification {
    let status = fault.kind().status();

    match fault {
        Fault::BusinessRule { message, details } => Classification {
            status,
            message: message.clone(),
            data: Some(details.clone()),
        },
        Fault::NotFound { message, .. } | Fault::InvalidArgument { message, .. } => {
            Classification {
                status,
                message: message.clone(),
                data: None,
            }
        }
        Fault::DataAccess { .. } => Classification {
            status,
            message: DATABASE_ERROR_MESSAGE.to_string(),
            data: None,
        },
        Fault::Unexpected { .. } => Classification {
            status,
            message: UNEXPECTED_ERROR_MESSAGE.to_string(),
            data: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultKind;
    use proptest::prelude::*;

    #[test]
    fn test_business_rule_carries_details() {
        let details = serde_json::json!({ "limit": 5, "attempted": 6 });
        let c = classify(&Fault::business_rule("Too many orders", details.clone()));

        assert_eq!(c.status, StatusCode::BAD_REQUEST);
        assert_eq!(c.message, "Too many orders");
        assert_eq!(c.data, Some(details));
    }

    #[test]
    fn test_not_found() {
        let c = classify(&Fault::not_found("Customer 9 was not found"));
        assert_eq!(c.status, StatusCode::NOT_FOUND);
        assert_eq!(c.message, "Customer 9 was not found");
        assert!(c.data.is_none());
    }

    #[test]
    fn test_invalid_argument() {
        let c = classify(&Fault::invalid_param("email", "email is malformed"));
        assert_eq!(c.status, StatusCode::BAD_REQUEST);
        assert_eq!(c.message, "email is malformed");
        assert!(c.data.is_none());
    }

    #[test]
    fn test_data_access_hides_driver_message() {
        let c = classify(&Fault::data_access(anyhow::anyhow!(
            "login failed for user 'sa' on server db-01"
        )));
        assert_eq!(c.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(c.message, DATABASE_ERROR_MESSAGE);
        assert!(c.data.is_none());
    }

    #[test]
    fn test_unexpected_is_generic() {
        let c = classify(&Fault::from_panic(Box::new("index out of bounds")));
        assert_eq!(c.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(c.message, UNEXPECTED_ERROR_MESSAGE);
        assert!(c.data.is_none());
    }

    #[test]
    fn test_payload_less_faults_write_null_data() {
        let envelope = crate::ResponseEnvelope::from(classify(&Fault::not_found("gone")));
        let value: serde_json::Value =
            serde_json::from_slice(&envelope.to_json_bytes().unwrap()).unwrap();
        assert_eq!(value["data"], serde_json::Value::Null);
        assert_ne!(value["data"], serde_json::json!({}));
    }

    #[test]
    fn test_status_agrees_with_kind_table() {
        let faults = [
            Fault::business_rule("a", serde_json::Value::Null),
            Fault::not_found("b"),
            Fault::invalid_argument("c"),
            Fault::data_access_message("d"),
            Fault::unexpected_message("e"),
        ];

        for (fault, kind) in faults.iter().zip(FaultKind::ALL) {
            assert_eq!(fault.kind(), kind);
            assert_eq!(classify(fault).status, kind.status());
        }
    }

    proptest! {
        #[test]
        fn prop_client_faults_echo_their_message(message in ".{0,64}") {
            let not_found = classify(&Fault::not_found(message.clone()));
            prop_assert_eq!(not_found.status, StatusCode::NOT_FOUND);
            prop_assert_eq!(&not_found.message, &message);

            let invalid = classify(&Fault::invalid_argument(message.clone()));
            prop_assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
            prop_assert_eq!(&invalid.message, &message);
        }

        #[test]
        fn prop_unrecognized_faults_never_leak(message in ".{0,64}") {
            let c = classify(&Fault::unexpected_message(message));
            prop_assert_eq!(c.status, StatusCode::INTERNAL_SERVER_ERROR);
            prop_assert_eq!(c.message.as_str(), UNEXPECTED_ERROR_MESSAGE);
            prop_assert!(c.data.is_none());
        }

        #[test]
        fn prop_classification_is_deterministic(message in "[a-z ]{1,32}") {
            let fault = Fault::business_rule(message, serde_json::json!({ "k": 1 }));
            prop_assert_eq!(classify(&fault), classify(&fault));
        }
    }
}
