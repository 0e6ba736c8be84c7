//! Integration tests for the ifc2glb REST API
//!
//! Tests the complete request path: multipart upload, staging, converter
//! invocation, cleanup and the attachment response.

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use ifc2glb::core::config::StagingMode;
use ifc2glb::core::types::{ErrorResponse, HealthResponse};
use tempfile::TempDir;
use tower::ServiceExt as TowerServiceExt;

use crate::common::{
    body_bytes, convert_request, create_test_app, dir_is_empty, multipart_body, test_config,
    wait_for, ConverterScript, TestApp, BOUNDARY, SAMPLE_IFC,
};

async fn error_body(response: axum::http::Response<Body>) -> ErrorResponse {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_startup_page() {
    let app = create_test_app(ConverterScript::Copy, StagingMode::Isolated);

    let response = app
        .router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"Startup page");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(ConverterScript::Copy, StagingMode::Shared);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.converter, "/bin/sh");
    assert_eq!(health.staging, "shared");
    assert!(!health.version.is_empty());
}

#[tokio::test]
async fn test_convert_returns_converter_output() {
    let app = create_test_app(ConverterScript::Uppercase, StagingMode::Isolated);

    let response = app
        .router
        .oneshot(convert_request(multipart_body(
            "ifc_file",
            "house.ifc",
            SAMPLE_IFC.as_bytes(),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"house.glb\""
    );
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "model/gltf-binary"
    );

    let body = body_bytes(response).await;
    assert_eq!(body, SAMPLE_IFC.to_uppercase().into_bytes());
}

#[tokio::test]
async fn test_shared_mode_artifacts() {
    let app = create_test_app(ConverterScript::Copy, StagingMode::Shared);

    let response = app
        .router
        .clone()
        .oneshot(convert_request(multipart_body(
            "ifc_file",
            "house.ifc",
            SAMPLE_IFC.as_bytes(),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // Input is gone, output stays until the next request
    assert!(!app.work_dir.path().join("temporary.ifc").exists());
    assert_eq!(
        std::fs::read(app.work_dir.path().join("output.glb")).unwrap(),
        SAMPLE_IFC.as_bytes()
    );
}

#[tokio::test]
async fn test_isolated_mode_leaves_work_dir_empty() {
    let app = create_test_app(ConverterScript::Copy, StagingMode::Isolated);

    let response = app
        .router
        .clone()
        .oneshot(convert_request(multipart_body("ifc_file", "a.ifc", b"IFC")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"IFC");

    // The stage is released once the streamed body has been consumed
    assert!(wait_for(|| dir_is_empty(app.work_dir.path())).await);
}

#[tokio::test]
async fn test_response_is_streamed_with_length() {
    let app = create_test_app(ConverterScript::Copy, StagingMode::Isolated);
    let model = SAMPLE_IFC.repeat(2_000);

    let response = app
        .router
        .clone()
        .oneshot(convert_request(multipart_body(
            "ifc_file",
            "large.ifc",
            model.as_bytes(),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_LENGTH],
        model.len().to_string().as_str()
    );

    // Output is still on disk while the body is unread
    assert!(!dir_is_empty(app.work_dir.path()));
    assert_eq!(body_bytes(response).await, model.as_bytes());
    assert!(wait_for(|| dir_is_empty(app.work_dir.path())).await);
}

#[tokio::test]
async fn test_fields_before_upload_are_skipped() {
    let app = create_test_app(ConverterScript::Copy, StagingMode::Isolated);

    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"comment\"\r\n\r\nlevel 2\r\n"
    )
    .into_bytes();
    body.extend(multipart_body("ifc_file", "house.ifc", b"IFC model"));

    let response = app.router.oneshot(convert_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"IFC model");
}

#[tokio::test]
async fn test_sequential_requests_both_succeed() {
    for mode in [StagingMode::Shared, StagingMode::Isolated] {
        let app = create_test_app(ConverterScript::Copy, mode);

        for payload in [&b"first model"[..], &b"second model"[..]] {
            let response = app
                .router
                .clone()
                .oneshot(convert_request(multipart_body("ifc_file", "m.ifc", payload)))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK, "mode {mode}");
            assert_eq!(body_bytes(response).await, payload);
        }
    }
}

#[tokio::test]
async fn test_concurrent_isolated_requests_do_not_collide() {
    let app = create_test_app(ConverterScript::SlowCopy, StagingMode::Isolated);

    let first = app
        .router
        .clone()
        .oneshot(convert_request(multipart_body("ifc_file", "a.ifc", b"model A")));
    let second = app
        .router
        .clone()
        .oneshot(convert_request(multipart_body("ifc_file", "b.ifc", b"model B")));

    let (first, second) = tokio::join!(first, second);
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_bytes(first).await, b"model A");
    assert_eq!(body_bytes(second).await, b"model B");
}

#[tokio::test]
async fn test_missing_upload_field() {
    let app = create_test_app(ConverterScript::Copy, StagingMode::Isolated);

    let response = app
        .router
        .oneshot(convert_request(multipart_body(
            "model",
            "house.ifc",
            SAMPLE_IFC.as_bytes(),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = error_body(response).await;
    assert_eq!(error.status, 400);
    assert!(error.error.contains("ifc_file"));
}

#[tokio::test]
async fn test_get_without_form_is_bad_request() {
    let app = create_test_app(ConverterScript::Copy, StagingMode::Isolated);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/convert_ifc_to_glb")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unavailable_converter_is_server_error() {
    let work_dir = TempDir::new().unwrap();
    let mut config = test_config(ConverterScript::Copy, StagingMode::Shared, &work_dir);
    config.converter.program = "/nonexistent/IfcConvert".to_string();
    config.converter.args.clear();
    let app = TestApp::from_config(config, work_dir);

    let response = app
        .router
        .clone()
        .oneshot(convert_request(multipart_body("ifc_file", "a.ifc", b"IFC")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(error_body(response).await.error.contains("/nonexistent/IfcConvert"));
    assert!(!app.work_dir.path().join("temporary.ifc").exists());
}

#[tokio::test]
async fn test_hung_converter_times_out() {
    let work_dir = TempDir::new().unwrap();
    let mut config = test_config(ConverterScript::Hang, StagingMode::Shared, &work_dir);
    config.converter.timeout_sec = 1;
    let app = TestApp::from_config(config, work_dir);

    let start = Instant::now();
    let response = app
        .router
        .clone()
        .oneshot(convert_request(multipart_body("ifc_file", "a.ifc", b"IFC")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(!app.work_dir.path().join("temporary.ifc").exists());
}

#[tokio::test]
async fn test_failing_converter_reports_stderr() {
    let app = create_test_app(ConverterScript::Fail, StagingMode::Shared);

    let response = app
        .router
        .clone()
        .oneshot(convert_request(multipart_body("ifc_file", "a.ifc", b"IFC")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let error = error_body(response).await;
    assert!(error.error.contains("unsupported schema"));
    assert!(!app.work_dir.path().join("temporary.ifc").exists());
}

#[tokio::test]
async fn test_converter_without_output_is_server_error() {
    let app = create_test_app(ConverterScript::NoOutput, StagingMode::Isolated);

    let response = app
        .router
        .oneshot(convert_request(multipart_body("ifc_file", "a.ifc", b"IFC")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error_body(response).await.error.contains("no output"));
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let work_dir = TempDir::new().unwrap();
    let mut config = test_config(ConverterScript::Copy, StagingMode::Isolated, &work_dir);
    config.server.max_upload_mb = 1;
    let app = TestApp::from_config(config, work_dir);

    let oversized = vec![b'x'; 2 * 1024 * 1024];
    let response = app
        .router
        .oneshot(convert_request(multipart_body("ifc_file", "big.ifc", &oversized)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
