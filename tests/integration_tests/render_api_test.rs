//! `POST /api/generate-pdf` contract tests
//!
//! 1. Missing or blank HTML is rejected before a browser starts
//! 2. Successful renders return the PDF as an attachment
//! 3. Every acquired browser is released, whatever the outcome

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};
use serde_json::json;

use kudumbam::render::{RenderRequest, RenderService};

use super::{body_bytes, body_json, json_request, send, test_app};
use crate::common::{FakeBehavior, FakeProvisioner, FAKE_PDF};

const ENDPOINT: &str = "/api/generate-pdf";

// ============================================================================
// Client Errors
// ============================================================================

#[tokio::test]
async fn test_missing_html_is_bad_request() {
    let provisioner = FakeProvisioner::new(FakeBehavior::Succeed);
    let (router, _) = test_app(&provisioner);

    let response = send(&router, json_request("POST", ENDPOINT, r#"{"filename":"x.pdf"}"#)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "HTML content is required" })
    );
    assert_eq!(provisioner.acquired(), 0);
}

#[tokio::test]
async fn test_blank_html_is_bad_request() {
    let provisioner = FakeProvisioner::new(FakeBehavior::Succeed);
    let (router, _) = test_app(&provisioner);

    for body in [r#"{"html":""}"#, r#"{"html":"   \n"}"#, r#"{"html":null}"#] {
        let response = send(&router, json_request("POST", ENDPOINT, body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
    }
    assert_eq!(provisioner.acquired(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let provisioner = FakeProvisioner::new(FakeBehavior::Succeed);
    let (router, _) = test_app(&provisioner);

    let response = send(&router, json_request("POST", ENDPOINT, "{not json")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "HTML content is required" })
    );
    assert_eq!(provisioner.acquired(), 0);
}

// ============================================================================
// Success
// ============================================================================

#[tokio::test]
async fn test_render_returns_pdf_attachment() {
    let provisioner = FakeProvisioner::new(FakeBehavior::Succeed);
    let (router, state) = test_app(&provisioner);

    let body = json!({ "html": "<h1>Directory</h1>", "filename": "parish.pdf" }).to_string();
    let response = send(&router, json_request("POST", ENDPOINT, &body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"parish.pdf\""
    );
    assert_eq!(body_bytes(response).await, FAKE_PDF);
    assert_eq!(provisioner.last_html().as_deref(), Some("<h1>Directory</h1>"));

    assert_eq!(provisioner.acquired(), 1);
    assert_eq!(provisioner.closed(), 1);
    assert_eq!(state.renderer.open_sessions(), 0);
}

#[tokio::test]
async fn test_default_filename() {
    let provisioner = FakeProvisioner::new(FakeBehavior::Succeed);
    let (router, _) = test_app(&provisioner);

    let response = send(&router, json_request("POST", ENDPOINT, r#"{"html":"<p>x</p>"}"#)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"document.pdf\""
    );
}

#[tokio::test]
async fn test_filename_is_sanitized() {
    let provisioner = FakeProvisioner::new(FakeBehavior::Succeed);
    let (router, _) = test_app(&provisioner);

    let body = json!({ "html": "<p>x</p>", "filename": "../../etc/\"evil\"\r\n.pdf" }).to_string();
    let response = send(&router, json_request("POST", ENDPOINT, &body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(disposition.matches('"').count(), 2);
    assert!(!disposition.contains('/'));
}

// ============================================================================
// Failures and Release
// ============================================================================

#[tokio::test]
async fn test_render_failure_is_generic_server_error() {
    let provisioner = FakeProvisioner::new(FakeBehavior::FailLoad);
    let (router, state) = test_app(&provisioner);

    let response = send(&router, json_request("POST", ENDPOINT, r#"{"html":"<p>x</p>"}"#)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Failed to generate PDF" })
    );
    assert_eq!(provisioner.acquired(), 1);
    assert_eq!(provisioner.closed(), 1);
    assert_eq!(state.renderer.open_sessions(), 0);
}

#[tokio::test]
async fn test_stalled_browser_is_released_after_timeout() {
    let provisioner = FakeProvisioner::new(FakeBehavior::Hang);
    let (router, state) = test_app(&provisioner);

    let response = send(&router, json_request("POST", ENDPOINT, r#"{"html":"<p>x</p>"}"#)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(provisioner.acquired(), 1);
    assert_eq!(provisioner.closed(), 1);
    assert_eq!(state.renderer.open_sessions(), 0);
}

#[tokio::test]
async fn test_cancelled_render_releases_browser() {
    let provisioner = FakeProvisioner::new(FakeBehavior::Hang);
    let service = RenderService::new(Arc::new(provisioner.clone()));

    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        service.render(RenderRequest::new("<p>x</p>")),
    )
    .await;
    assert!(cancelled.is_err());
    assert_eq!(service.open_sessions(), 0);

    for _ in 0..100 {
        if provisioner.closed() == provisioner.acquired() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(provisioner.acquired(), 1);
    assert_eq!(provisioner.closed(), 1);
}

#[tokio::test]
async fn test_one_browser_per_request() {
    let provisioner = FakeProvisioner::new(FakeBehavior::Succeed);
    let (router, _) = test_app(&provisioner);

    for _ in 0..3 {
        let response =
            send(&router, json_request("POST", ENDPOINT, r#"{"html":"<p>x</p>"}"#)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(provisioner.acquired(), 3);
    assert_eq!(provisioner.closed(), 3);
}
