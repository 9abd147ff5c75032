//! Integration tests module
//!
//! End-to-end tests of the HTTP surface with a fake browser provisioner:
//! - PDF rendering contract and browser release
//! - Household CRUD, validation and lookups
//! - Directory export from stored households

pub mod families_api_test;
pub mod pipeline_test;
pub mod render_api_test;

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use tower::ServiceExt;

use kudumbam::render::RenderService;
use kudumbam::server::{AppState, DirectoryServer, ServerConfig};
use kudumbam::storage::{create_mock_repository, SharedDirectoryRepository};

use crate::common::FakeProvisioner;

/// Router over a mock repository and a fake browser
pub fn test_app(provisioner: &FakeProvisioner) -> (Router, AppState) {
    test_app_with(provisioner, create_mock_repository())
}

pub fn test_app_with(
    provisioner: &FakeProvisioner,
    repository: SharedDirectoryRepository,
) -> (Router, AppState) {
    let renderer = RenderService::new(Arc::new(provisioner.clone()))
        .with_timeout(Duration::from_millis(200));
    let state = AppState::new(repository, renderer).unwrap();
    let config = ServerConfig::builder()
        .enable_request_logging(false)
        .build()
        .unwrap();
    let server = DirectoryServer::with_state(config, state);
    (server.build_router(), server.state())
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
