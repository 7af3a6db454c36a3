//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use herald_core::{Fault, ResponseEnvelope};
use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::StatusCode;
use http_body::Body as _;
use http_body_util::Full;

/// The HTTP request type used in the middleware pipeline.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

/// What inner stages and handlers return.
///
/// Faults travel upstream as `Err` until the error translation boundary
/// turns them into a response.
pub type MiddlewareResult = Result<Response, Fault>;

/// Header carrying the request ID on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Content type of every envelope.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type of the last-resort plain-text response.
pub const PLAIN_TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Extension trait for building and inspecting pipeline responses.
pub trait ResponseExt {
    /// Creates a `application/json` response from already-encoded bytes.
    fn json_bytes(status: StatusCode, body: Bytes) -> Response;

    /// Creates a `text/plain` response.
    fn plain_text(status: StatusCode, message: &str) -> Response;

    /// Encodes an envelope into a response whose status matches the body.
    ///
    /// An envelope carrying an invalid status code is sent as `500`.
    fn envelope(envelope: &ResponseEnvelope) -> Result<Response, serde_json::Error>;

    /// Returns `true` unless the body is known to be empty.
    fn has_body(&self) -> bool;
}

impl ResponseExt for Response {
    fn json_bytes(status: StatusCode, body: Bytes) -> Response {
        with_content_type(status, body, JSON_CONTENT_TYPE)
    }

    fn plain_text(status: StatusCode, message: &str) -> Response {
        with_content_type(
            status,
            Bytes::copy_from_slice(message.as_bytes()),
            PLAIN_TEXT_CONTENT_TYPE,
        )
    }

    fn envelope(envelope: &ResponseEnvelope) -> Result<Response, serde_json::Error> {
        let body = envelope.to_json_bytes()?;
        let status = envelope
            .status()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Ok(Self::json_bytes(status, Bytes::from(body)))
    }

    fn has_body(&self) -> bool {
        self.body().size_hint().exact() != Some(0)
    }
}

fn with_content_type(status: StatusCode, body: Bytes, content_type: &'static str) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Replaces a response's body, keeping its status and other headers.
pub(crate) fn replace_body(response: Response, body: Bytes, content_type: &'static str) -> Response {
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(CONTENT_LENGTH);
    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    http::Response::from_parts(parts, Full::new(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_response() {
        let response = Response::plain_text(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            PLAIN_TEXT_CONTENT_TYPE
        );
        assert!(response.has_body());
    }

    #[test]
    fn test_envelope_response_status_matches_body() {
        let response = Response::envelope(&ResponseEnvelope::forbidden()).unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );
    }

    #[test]
    fn test_has_body() {
        let empty = Response::new(Full::new(Bytes::new()));
        assert!(!empty.has_body());

        let full = Response::new(Full::new(Bytes::from_static(b"{}")));
        assert!(full.has_body());
    }

    #[test]
    fn test_replace_body_keeps_other_headers() {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = StatusCode::UNAUTHORIZED;
        response.headers_mut().insert(
            http::header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Bearer"),
        );
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from_static("0"));

        let replaced = replace_body(response, Bytes::from_static(b"{}"), JSON_CONTENT_TYPE);

        assert_eq!(replaced.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            replaced.headers().get(http::header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
        assert!(replaced.headers().get(CONTENT_LENGTH).is_none());
        assert!(replaced.has_body());
    }
}
