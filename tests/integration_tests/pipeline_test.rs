//! Store → compose → render pipeline tests
//!
//! Households written through the repository come back out of the directory
//! endpoints as HTML and as a PDF attachment.

use axum::http::{header, StatusCode};
use chrono::Local;
use tempfile::TempDir;

use kudumbam::storage::{create_sqlite_repository, DirectoryRepository, SharedDirectoryRepository};

use super::{body_bytes, get, send, test_app_with};
use crate::common::{create_test_household, FakeBehavior, FakeProvisioner, FAKE_PDF};

fn seeded_repository(dir: &TempDir, count: usize) -> SharedDirectoryRepository {
    let repository = create_sqlite_repository(dir.path().join("directory.db")).unwrap();
    for i in (1..=count).rev() {
        repository
            .create(&create_test_household(&i.to_string()))
            .unwrap();
    }
    repository
}

#[tokio::test]
async fn test_directory_html_preview() {
    let dir = TempDir::new().unwrap();
    let provisioner = FakeProvisioner::new(FakeBehavior::Succeed);
    let (router, _) = test_app_with(&provisioner, seeded_repository(&dir, 3));

    let response = send(&router, get("/api/directory/html?language=english")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("Page 1 of 2"));
    assert!(html.contains("Page 2 of 2"));
    assert_eq!(html.matches("class=\"family-section\"").count(), 3);

    // Snapshot is ordered by house number, not insertion order
    let one = html.find("<div class=\"house-number\">1</div>").unwrap();
    let three = html.find("<div class=\"house-number\">3</div>").unwrap();
    assert!(one < three);
    assert_eq!(provisioner.acquired(), 0);
}

#[tokio::test]
async fn test_directory_pdf_download() {
    let dir = TempDir::new().unwrap();
    let provisioner = FakeProvisioner::new(FakeBehavior::Succeed);
    let (router, state) = test_app_with(&provisioner, seeded_repository(&dir, 2));

    let response = send(&router, get("/api/directory/pdf?language=malayalam")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let expected = format!(
        "attachment; filename=\"family-directory-malayalam-{}.pdf\"",
        Local::now().date_naive().format("%Y-%m-%d")
    );
    assert_eq!(response.headers()[header::CONTENT_DISPOSITION], expected.as_str());
    assert_eq!(body_bytes(response).await, FAKE_PDF);

    let rendered = provisioner.last_html().unwrap();
    assert!(rendered.contains("<html lang=\"ml\">"));
    assert!(rendered.contains("ജോസഫ്"));
    assert_eq!(state.renderer.open_sessions(), 0);
}

#[tokio::test]
async fn test_directory_pdf_failure() {
    let dir = TempDir::new().unwrap();
    let provisioner = FakeProvisioner::new(FakeBehavior::FailLoad);
    let (router, _) = test_app_with(&provisioner, seeded_repository(&dir, 1));

    let response = send(&router, get("/api/directory/pdf")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(provisioner.closed(), 1);
}

#[tokio::test]
async fn test_directory_unknown_language() {
    let dir = TempDir::new().unwrap();
    let provisioner = FakeProvisioner::new(FakeBehavior::Succeed);
    let (router, _) = test_app_with(&provisioner, seeded_repository(&dir, 1));

    let response = send(&router, get("/api/directory/html?language=tamil")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&router, get("/api/directory/pdf?language=tamil")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(provisioner.acquired(), 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let dir = TempDir::new().unwrap();
    let provisioner = FakeProvisioner::new(FakeBehavior::Succeed);
    let (router, _) = test_app_with(&provisioner, seeded_repository(&dir, 1));

    let response = send(&router, get("/metrics")).await;
    assert_eq!(response.status(), StatusCode::OK);
}
