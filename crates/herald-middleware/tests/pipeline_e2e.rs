//! End-to-end pipeline integration tests.
//!
//! These run real requests through the standard chain:
//!
//! 1. Error Translation - Fault and panic boundary
//! 2. Request Tagging - Correlation identity and log target
//! 3. Auth Outcome Rewrite - 401/403 envelopes

use bytes::Bytes;
use herald_core::{
    Fault, FaultKind, Principal, ResponseEnvelope, DATABASE_ERROR_MESSAGE,
    UNEXPECTED_ERROR_MESSAGE,
};
use herald_middleware::{
    BoxFuture, MiddlewareContext, MiddlewareResult, Pipeline, Request, RequestTaggingStage,
    Response, TranslatedFault, JSON_CONTENT_TYPE, REQUEST_ID_HEADER,
};
use herald_telemetry::capture;
use http::header::CONTENT_TYPE;
use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
use http_body_util::{BodyExt, Full};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::Level;

// ============================================================================
// Helpers
// ============================================================================

fn make_request(path: &str) -> Request {
    HttpRequest::builder()
        .method("GET")
        .uri(path)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn make_authenticated_request(path: &str, user_id: &str) -> Request {
    let mut request = make_request(path);
    request.extensions_mut().insert(Principal::new(user_id));
    request
}

fn status_response(status: StatusCode) -> Response {
    let mut response = HttpResponse::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

fn raising(
    fault: Fault,
) -> impl FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, MiddlewareResult> {
    move |_ctx, _req| Box::pin(async move { Err(fault) })
}

fn returning(
    status: StatusCode,
) -> impl FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, MiddlewareResult> {
    move |_ctx, _req| Box::pin(async move { Ok(status_response(status)) })
}

async fn envelope_of(response: Response) -> ResponseEnvelope {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    ResponseEnvelope::from_json_slice(&bytes).unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ============================================================================
// Classification through the full chain
// ============================================================================

#[tokio::test]
async fn test_every_fault_kind_maps_to_its_envelope() {
    let pipeline = Pipeline::standard();
    let details = serde_json::json!({ "field": "quantity", "max": 10 });

    let cases = [
        (
            Fault::business_rule("Quantity exceeds stock", details.clone()),
            StatusCode::BAD_REQUEST,
            "Quantity exceeds stock",
            Some(details.clone()),
        ),
        (
            Fault::not_found("Product 44 was not found"),
            StatusCode::NOT_FOUND,
            "Product 44 was not found",
            None,
        ),
        (
            Fault::invalid_param("sort", "sort must be one of: name, price"),
            StatusCode::BAD_REQUEST,
            "sort must be one of: name, price",
            None,
        ),
        (
            Fault::data_access_message("connection pool exhausted"),
            StatusCode::INTERNAL_SERVER_ERROR,
            DATABASE_ERROR_MESSAGE,
            None,
        ),
        (
            Fault::unexpected_message("null reference"),
            StatusCode::INTERNAL_SERVER_ERROR,
            UNEXPECTED_ERROR_MESSAGE,
            None,
        ),
    ];

    for (fault, status, message, data) in cases {
        let kind = fault.kind();
        let response = pipeline
            .process(make_request("/products"), raising(fault))
            .await;

        assert_eq!(response.status(), status, "kind {kind}");
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );

        let envelope = envelope_of(response).await;
        assert_eq!(envelope.status_code, status.as_u16());
        assert_eq!(envelope.status_message, message);
        assert!(!envelope.is_success);
        assert_eq!(envelope.total_count, 0);
        assert_eq!(envelope.data, data);
    }
}

#[tokio::test]
async fn test_unrecognized_faults_are_generic_500() {
    let pipeline = Pipeline::standard();

    let faults = [
        Fault::unexpected(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk quota exceeded on /var/data",
        )),
        Fault::from(anyhow::anyhow!("thread pool shut down")),
    ];

    for fault in faults {
        let response = pipeline
            .process(make_request("/reports"), raising(fault))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert!(body.contains(UNEXPECTED_ERROR_MESSAGE));
        assert!(!body.contains("disk quota"));
        assert!(!body.contains("thread pool"));
    }
}

#[tokio::test]
async fn test_handler_panic_is_translated() {
    let pipeline = Pipeline::standard();
    let mut ctx = MiddlewareContext::new();

    let response = pipeline
        .process_with_context(&mut ctx, make_request("/explode"), |_ctx, _req| {
            panic!("handler bug")
        })
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(REQUEST_ID_HEADER).is_some());
    let envelope = envelope_of(response).await;
    assert_eq!(envelope.status_message, UNEXPECTED_ERROR_MESSAGE);

    let translated = ctx.get_extension::<TranslatedFault>().unwrap();
    assert_eq!(translated.kind, FaultKind::Unexpected);
    assert!(translated.from_panic);
}

// ============================================================================
// Single write
// ============================================================================

#[tokio::test]
async fn test_envelope_is_written_once() {
    let pipeline = Pipeline::standard();
    let response = pipeline
        .process(
            make_request("/orders/1"),
            raising(Fault::not_found("Order 1 was not found")),
        )
        .await;

    let body = body_string(response).await;
    assert_eq!(body.matches("statusCode").count(), 1);
    assert!(serde_json::from_str::<serde_json::Value>(&body).is_ok());
}

#[tokio::test]
async fn test_fault_after_body_written_is_not_concatenated() {
    let pipeline = Pipeline::standard();
    let response = pipeline
        .process(make_request("/orders/stream"), |ctx, _req| {
            ctx.mark_body_written();
            Box::pin(async { Err(Fault::unexpected_message("stream broke")) })
        })
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["statusCode"], 500);
}

// ============================================================================
// Auth outcome rewrite
// ============================================================================

#[tokio::test]
async fn test_401_becomes_unauthorized_envelope() {
    let pipeline = Pipeline::standard();
    let response = pipeline
        .process(make_request("/me"), returning(StatusCode::UNAUTHORIZED))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_string(response).await,
        r#"{"statusCode":401,"statusMessage":"Unauthorized","isSuccess":false,"totalCount":0,"data":null}"#
    );
}

#[tokio::test]
async fn test_403_becomes_forbidden_envelope() {
    let pipeline = Pipeline::standard();
    let response = pipeline
        .process(
            make_authenticated_request("/admin", "user-3"),
            returning(StatusCode::FORBIDDEN),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_string(response).await,
        r#"{"statusCode":403,"statusMessage":"Forbidden","isSuccess":false,"totalCount":0,"data":null}"#
    );
}

#[tokio::test]
async fn test_success_is_untouched_and_silent() {
    let (subscriber, events) = capture::subscriber();
    let _guard = tracing::subscriber::set_default(subscriber);

    let pipeline = Pipeline::standard();

    for status in [StatusCode::OK, StatusCode::CREATED, StatusCode::NO_CONTENT] {
        let response = pipeline
            .process(make_request("/health"), returning(status))
            .await;
        assert_eq!(response.status(), status);
        assert!(body_string(response).await.is_empty());
    }

    assert_eq!(events.count_at(Level::ERROR), 0);
    assert_eq!(events.count_at(Level::WARN), 0);

    let boundary_events: Vec<_> = events
        .all()
        .into_iter()
        .filter(|event| event.target == "herald_middleware::stages::error_translation")
        .collect();
    assert!(
        boundary_events.is_empty(),
        "error translation logged on success: {boundary_events:?}"
    );
}

// ============================================================================
// Tagging and logging
// ============================================================================

#[tokio::test]
async fn test_fault_logged_once_with_correlation_fields() {
    let (subscriber, events) = capture::subscriber();
    let _guard = tracing::subscriber::set_default(subscriber);

    let pipeline = Pipeline::standard();
    let mut ctx = MiddlewareContext::new();

    pipeline
        .process_with_context(
            &mut ctx,
            make_authenticated_request("/orders", "user-42"),
            raising(Fault::data_access_message("deadlock on orders")),
        )
        .await;

    let errors = events.at(Level::ERROR);
    assert_eq!(errors.len(), 1);

    let entry = &errors[0];
    assert_eq!(entry.field("correlation_id"), Some("user-42"));
    assert_eq!(entry.field("fault_kind"), Some("data_access"));
    assert_eq!(entry.field("log_target"), Some(ctx.log_target_name()));
    assert!(entry.field("error").unwrap().contains("deadlock on orders"));

    let pattern = Regex::new(r"^request_user-42_\d{8}_\d{9}$").unwrap();
    assert!(pattern.is_match(ctx.log_target_name()));
}

#[tokio::test]
async fn test_anonymous_request_is_unknown() {
    let pipeline = Pipeline::standard();
    let mut ctx = MiddlewareContext::new();

    pipeline
        .process_with_context(&mut ctx, make_request("/public"), returning(StatusCode::OK))
        .await;

    assert!(ctx.correlation_id().is_unknown());
    let pattern = Regex::new(r"^request_Unknown_\d{8}_\d{9}$").unwrap();
    assert!(pattern.is_match(ctx.log_target_name()));
    assert_eq!(
        ctx.log_target().unwrap().path().parent().unwrap().to_str(),
        Some("Logs")
    );
}

#[tokio::test]
async fn test_handler_sees_tagged_context() {
    let pipeline = Pipeline::standard();

    let response = pipeline
        .process(make_authenticated_request("/whoami", "svc-billing"), |ctx, _req| {
            let who = ctx.correlation_id().to_string();
            Box::pin(async move { Ok(HttpResponse::new(Full::new(Bytes::from(who)))) })
        })
        .await;

    assert_eq!(body_string(response).await, "svc-billing");
}

#[tokio::test]
async fn test_trusted_request_id_is_echoed() {
    let pipeline = Pipeline::builder()
        .request_tagging(RequestTaggingStage::new().trust_incoming_request_id(true))
        .build();

    let incoming = "01927a3c-5f4e-7d2a-9b1c-3e8f6a2d4c10";
    let mut request = make_request("/orders");
    request
        .headers_mut()
        .insert(REQUEST_ID_HEADER, incoming.parse().unwrap());

    let response = pipeline
        .process(request, raising(Fault::not_found("Order 9 was not found")))
        .await;

    assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), incoming);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_are_isolated() {
    let pipeline = Arc::new(Pipeline::standard());

    let tasks: Vec<_> = (0..100_u32)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                let user = format!("user-{i}");
                let request = make_authenticated_request("/orders", &user);
                let mut ctx = MiddlewareContext::new();

                let response = pipeline
                    .process_with_context(&mut ctx, request, move |ctx, _req| {
                        let seen = ctx.correlation_id().to_string();
                        Box::pin(async move {
                            tokio::task::yield_now().await;
                            match i % 4 {
                                0 => Err(Fault::business_rule(
                                    format!("Rule broken by {seen}"),
                                    serde_json::json!({ "index": i }),
                                )),
                                1 => Err(Fault::not_found(format!("Order {i} was not found"))),
                                2 => Ok(status_response(StatusCode::UNAUTHORIZED)),
                                _ => Ok(HttpResponse::new(Full::new(Bytes::from(seen)))),
                            }
                        })
                    })
                    .await;

                let request_id = response
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .unwrap()
                    .to_str()
                    .unwrap()
                    .to_string();
                assert_eq!(request_id, ctx.request_id().to_string());
                assert_eq!(ctx.correlation_id().as_str(), user);

                (i, user, request_id, response)
            })
        })
        .collect();

    let mut request_ids = HashSet::new();

    for task in tasks {
        let (i, user, request_id, response) = task.await.unwrap();
        assert!(request_ids.insert(request_id), "duplicate request id");

        match i % 4 {
            0 => {
                assert_eq!(response.status(), StatusCode::BAD_REQUEST);
                let envelope = envelope_of(response).await;
                assert_eq!(envelope.status_message, format!("Rule broken by {user}"));
                assert_eq!(envelope.data, Some(serde_json::json!({ "index": i })));
            }
            1 => {
                assert_eq!(response.status(), StatusCode::NOT_FOUND);
                let envelope = envelope_of(response).await;
                assert_eq!(envelope.status_message, format!("Order {i} was not found"));
            }
            2 => {
                assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
                let envelope = envelope_of(response).await;
                assert_eq!(envelope.status_message, "Unauthorized");
            }
            _ => {
                assert_eq!(response.status(), StatusCode::OK);
                assert_eq!(body_string(response).await, user);
            }
        }
    }

    assert_eq!(request_ids.len(), 100);
}
