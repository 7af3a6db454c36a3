//! The uniform JSON response envelope.
//!
//! Every response the pipeline produces on its own account (translated
//! faults, rewritten authentication rejections) has this shape:
//!
//! ```json
//! {
//!   "statusCode": 404,
//!   "statusMessage": "Order 7 was not found",
//!   "isSuccess": false,
//!   "totalCount": 0,
//!   "data": null
//! }
//! ```
//!
//! Keys are written in camelCase in exactly this order. Reading is
//! case-insensitive on keys, so `StatusCode` and `statuscode` parse too.

use crate::classifier::Classification;
use http::StatusCode;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message used when an authentication check rejects the caller.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Message used when an authorization check rejects the caller.
pub const FORBIDDEN_MESSAGE: &str = "Forbidden";

/// The canonical response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// HTTP status mirrored into the body.
    pub status_code: u16,
    /// Human-readable summary.
    pub status_message: String,
    /// `false` iff `status_code >= 400`.
    pub is_success: bool,
    /// Number of items in `data` for collection responses, `0` for errors.
    pub total_count: u64,
    /// Structured detail payload.
    pub data: Option<serde_json::Value>,
}

impl ResponseEnvelope {
    /// Creates an error envelope.
    ///
    /// `is_success` is derived from the status and `total_count` is zero.
    #[must_use]
    pub fn error(
        status: StatusCode,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            status_code: status.as_u16(),
            status_message: message.into(),
            is_success: !is_failure_status(status),
            total_count: 0,
            data,
        }
    }

    /// Creates a success envelope carrying a payload.
    #[must_use]
    pub fn success(
        status: StatusCode,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
        total_count: u64,
    ) -> Self {
        Self {
            status_code: status.as_u16(),
            status_message: message.into(),
            is_success: !is_failure_status(status),
            total_count,
            data,
        }
    }

    /// The envelope written for a `401` outcome.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::error(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE, None)
    }

    /// The envelope written for a `403` outcome.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::error(StatusCode::FORBIDDEN, FORBIDDEN_MESSAGE, None)
    }

    /// Returns the status as an [`http::StatusCode`], if it is valid.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status_code).ok()
    }

    /// Encodes the envelope as JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes an envelope from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl From<Classification> for ResponseEnvelope {
    fn from(classification: Classification) -> Self {
        Self::error(
            classification.status,
            classification.message,
            classification.data,
        )
    }
}

fn is_failure_status(status: StatusCode) -> bool {
    status.as_u16() >= 400
}

impl<'de> Deserialize<'de> for ResponseEnvelope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut fields: HashMap<String, serde_json::Value> = raw
            .into_iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect();

        let status_code: u16 = take_required(&mut fields, "statuscode", "statusCode")?;
        let status_message: String = take_required(&mut fields, "statusmessage", "statusMessage")?;
        let is_success = take_optional(&mut fields, "issuccess")?.unwrap_or(status_code < 400);
        let total_count = take_optional(&mut fields, "totalcount")?.unwrap_or(0);
        let data = fields.remove("data").filter(|value| !value.is_null());

        Ok(Self {
            status_code,
            status_message,
            is_success,
            total_count,
            data,
        })
    }
}

fn take_required<T, E>(
    fields: &mut HashMap<String, serde_json::Value>,
    key: &str,
    wire_name: &'static str,
) -> Result<T, E>
where
    T: DeserializeOwned,
    E: de::Error,
{
    take_optional(fields, key)?.ok_or_else(|| E::missing_field(wire_name))
}

fn take_optional<T, E>(
    fields: &mut HashMap<String, serde_json::Value>,
    key: &str,
) -> Result<Option<T>, E>
where
    T: DeserializeOwned,
    E: de::Error,
{
    fields
        .remove(key)
        .map(|value| serde_json::from_value(value).map_err(E::custom))
        .transpose()
}
