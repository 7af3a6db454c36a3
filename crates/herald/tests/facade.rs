//! Building a pipeline from loaded configuration.

use bytes::Bytes;
use herald::prelude::*;
use herald::config::PipelineSection;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use std::io::Write;
use std::path::{Path, PathBuf};

fn request() -> Request {
    http::Request::builder()
        .uri("/orders/7")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

#[tokio::test]
async fn test_pipeline_uses_configured_log_directory() {
    let config = HeraldConfig::builder()
        .pipeline(PipelineSection {
            log_directory: PathBuf::from("/var/log/orders"),
            trust_incoming_request_id: false,
        })
        .build();

    let pipeline = herald::build_pipeline(&config);
    let mut ctx = MiddlewareContext::new();

    let response = pipeline
        .process_with_context(&mut ctx, request(), |_ctx, _req| {
            Box::pin(async { Err(Fault::not_found("Order 7 was not found")) })
        })
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let target = ctx.log_target().unwrap();
    assert_eq!(target.path().parent(), Some(Path::new("/var/log/orders")));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let envelope = ResponseEnvelope::from_json_slice(&bytes).unwrap();
    assert_eq!(envelope.status_message, "Order 7 was not found");
}

#[tokio::test]
async fn test_trusted_request_id_from_file_config() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(b"[pipeline]\ntrust_incoming_request_id = true\n")
        .unwrap();

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .load()
        .unwrap();
    let pipeline = herald::build_pipeline(&config);

    let incoming = RequestId::new().to_string();
    let mut req = request();
    req.headers_mut()
        .insert("x-request-id", incoming.parse().unwrap());

    let response = pipeline
        .process(req, |_ctx, _req| {
            Box::pin(async { Err(Fault::unexpected_message("cache offline")) })
        })
        .await;

    assert_eq!(response.headers().get("x-request-id").unwrap(), incoming.as_str());
}

#[test]
fn test_build_pipeline_keeps_core_order() {
    let pipeline = herald::build_pipeline(&HeraldConfig::development());
    assert_eq!(
        pipeline.stage_names(),
        vec!["error_translation", "request_tagging", "auth_outcome_rewrite"]
    );
}

#[test]
fn test_init_rejects_invalid_config() {
    let mut config = HeraldConfig::default();
    config.telemetry.service_name = String::new();

    let err = herald::init(&config).unwrap_err();
    assert!(matches!(err, herald::HeraldError::Config(_)));
}
