//! Household API tests over a file-backed SQLite repository

use axum::http::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

use kudumbam::storage::create_sqlite_repository;

use super::{body_json, get, json_request, send, test_app_with};
use crate::common::{FakeBehavior, FakeProvisioner};

fn app() -> (axum::Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let repository = create_sqlite_repository(dir.path().join("directory.db")).unwrap();
    let (router, _) = test_app_with(&FakeProvisioner::new(FakeBehavior::Succeed), repository);
    (router, dir)
}

fn household_body(house_number: &str, address: &str) -> String {
    json!({
        "house_number": house_number,
        "address_en": address,
        "address_ml": "",
        "phone": "0481 234567",
        "members": [
            { "name_en": "Joseph", "is_head": true, "age": 60, "blood_group": "o+" },
            { "name_en": "Mary", "relationship_en": "Wife" },
            { "name_en": "", "name_ml": "" }
        ]
    })
    .to_string()
}

async fn create(router: &axum::Router, house_number: &str, address: &str) -> Value {
    let response = send(
        router,
        json_request("POST", "/api/families", &household_body(house_number, address)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

// ============================================================================
// Create / Read
// ============================================================================

#[tokio::test]
async fn test_create_and_get_household() {
    let (router, _dir) = app();

    let created = create(&router, "12", "Church Road").await;
    assert_eq!(created["success"], true);
    let id = created["data"]["id"].as_i64().unwrap();

    // Blank member dropped, blood group normalized
    let members = created["data"]["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["name_en"], "Joseph");
    assert_eq!(members[0]["blood_group"], "O+");

    let response = send(&router, get(&format!("/api/families/{id}"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["data"]["house_number"], "12");
    assert_eq!(fetched["data"]["members"][0]["is_head"], true);
}

#[tokio::test]
async fn test_invalid_household_returns_field_errors() {
    let (router, _dir) = app();

    let body = json!({
        "house_number": "",
        "address_en": "Church Road",
        "phone": "abc",
        "is_on_rent": true,
        "members": [{ "name_en": "", "is_head": true }]
    })
    .to_string();
    let response = send(&router, json_request("POST", "/api/families", &body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    let errors = body["errors"].as_object().unwrap();
    assert!(errors.contains_key("house_number"));
    assert!(errors.contains_key("phone"));
    assert!(errors.contains_key("owner_name"));
    assert!(errors.contains_key("member_0_name_en"));
}

#[tokio::test]
async fn test_missing_household_is_not_found() {
    let (router, _dir) = app();

    let response = send(&router, get("/api/families/999")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &router,
        axum::http::Request::builder()
            .method("DELETE")
            .uri("/api/families/999")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// List
// ============================================================================

#[tokio::test]
async fn test_list_search_and_paginate() {
    let (router, _dir) = app();
    create(&router, "1", "Church Road").await;
    create(&router, "2", "Market Street").await;
    create(&router, "3", "church lane").await;

    let response = send(&router, get("/api/families?search=CHURCH&page_size=1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["items"][0]["house_number"], "1");

    let response = send(&router, get("/api/families?sort_by=address_en&order=desc")).await;
    let body = body_json(response).await;
    let first = &body["data"]["items"][0]["address_en"];
    assert_eq!(first, "church lane");
}

#[tokio::test]
async fn test_list_page_far_past_end_is_empty() {
    let (router, _dir) = app();
    create(&router, "1", "Church Road").await;

    let response = send(&router, get("/api/families?page=18446744073709551615")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["total_pages"], 1);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_rejects_unknown_sort_field() {
    let (router, _dir) = app();
    let response = send(&router, get("/api/families?sort_by=owner")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Update / Delete
// ============================================================================

#[tokio::test]
async fn test_update_reconciles_members() {
    let (router, _dir) = app();
    let created = create(&router, "5", "Hill View").await;
    let id = created["data"]["id"].as_i64().unwrap();
    let head_id = created["data"]["members"][0]["id"].as_i64().unwrap();

    // Keep the head, drop Mary, add a new member
    let body = json!({
        "house_number": "5A",
        "address_en": "Hill View",
        "members": [
            { "id": head_id, "name_en": "Joseph K", "is_head": true },
            { "name_en": "Anu", "relationship_en": "Daughter" }
        ]
    })
    .to_string();
    let response = send(&router, json_request("PUT", &format!("/api/families/{id}"), &body)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = body_json(response).await;
    assert_eq!(updated["data"]["house_number"], "5A");
    let members = updated["data"]["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["id"].as_i64(), Some(head_id));
    assert_eq!(members[0]["name_en"], "Joseph K");
    assert_eq!(members[1]["name_en"], "Anu");
}

#[tokio::test]
async fn test_update_rejects_member_of_other_household() {
    let (router, _dir) = app();
    let first = create(&router, "1", "Church Road").await;
    let second = create(&router, "2", "Market Street").await;
    let foreign = first["data"]["members"][0]["id"].as_i64().unwrap();
    let id = second["data"]["id"].as_i64().unwrap();

    let body = json!({
        "house_number": "2",
        "address_en": "Market Street",
        "members": [{ "id": foreign, "name_en": "Intruder", "is_head": true }]
    })
    .to_string();
    let response = send(&router, json_request("PUT", &format!("/api/families/{id}"), &body)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_household() {
    let (router, _dir) = app();
    let created = create(&router, "8", "Lake Side").await;
    let id = created["data"]["id"].as_i64().unwrap();

    let delete = axum::http::Request::builder()
        .method("DELETE")
        .uri(format!("/api/families/{id}"))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = send(&router, delete).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["house_number"], "8");

    let response = send(&router, get(&format!("/api/families/{id}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Lookups and Health
// ============================================================================

#[tokio::test]
async fn test_lookup_lists() {
    let (router, _dir) = app();

    let response = send(&router, get("/api/lookups/relationships")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 19);
    assert!(body["data"][0]["label"].as_str().unwrap().contains('('));

    let response = send(&router, get("/api/lookups/occupations")).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 23);

    let response = send(&router, get("/api/lookups/blood-groups")).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 8);

    let response = send(&router, get("/api/lookups/colours")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let (router, _dir) = app();
    let response = send(&router, get("/api/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["browser"], "fake");
    assert_eq!(body["data"]["open_sessions"], 0);
}
