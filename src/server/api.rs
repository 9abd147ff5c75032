//! REST API handlers for the directory server
//!
//! `POST /api/generate-pdf` answers with raw PDF bytes or a bare
//! `{"error": ...}` body. Every other JSON route uses the [`ApiResponse`]
//! envelope.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, MatchedPath, Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::composer::{directory_filename, ComposeError, ComposeOptions};
use crate::error::{DirectoryErrorTrait, Error};
use crate::lookup::{LookupError, LookupKind, LookupList};
use crate::metrics;
use crate::models::{Household, Language};
use crate::render::{RenderError, RenderRequest, RenderedPdf};
use crate::storage::{DirectoryRepository, ListQuery, Page, StorageError, StorageResult};
use crate::validation::{prepare_for_save, validate_household, ValidationError};

use super::server::AppState;

/// Message for a missing or unreadable render payload
pub const MISSING_HTML_MESSAGE: &str = "HTML content is required";

/// Message for any failure inside the render pipeline
pub const RENDER_FAILED_MESSAGE: &str = "Failed to generate PDF";

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            errors: None,
        }
    }
}

/// Body of a failed PDF request
#[derive(Debug, Serialize)]
pub struct RenderErrorBody {
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub browser: String,
    pub open_sessions: usize,
}

/// Language selector for directory exports
#[derive(Debug, Default, Deserialize)]
pub struct DirectoryQuery {
    pub language: Option<String>,
}

// ============================================================================
// API Errors
// ============================================================================

/// Errors from the JSON routes
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Validation(ValidationError),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            ApiError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    success: false,
                    error: "Validation failed".to_string(),
                    errors: Some(e.errors),
                },
            ),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(e) => ApiError::Validation(e),
            Error::Storage(e) if e.is_not_found() => ApiError::NotFound(e.to_string()),
            Error::Lookup(e @ LookupError::UnknownList(_)) => ApiError::NotFound(e.to_string()),
            other => ApiError::Internal(format!(
                "{} ({}, recoverable: {}): {other}",
                other.localized_desc(),
                other.category().localized_desc(),
                other.is_recoverable()
            )),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Error::from(e).into()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Error::from(e).into()
    }
}

impl From<LookupError> for ApiError {
    fn from(e: LookupError) -> Self {
        Error::from(e).into()
    }
}

impl From<ComposeError> for ApiError {
    fn from(e: ComposeError) -> Self {
        Error::from(e).into()
    }
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and metrics
        .route("/api/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        // PDF rendering
        .route("/api/generate-pdf", post(generate_pdf))
        // Households
        .route("/api/families", get(list_families).post(create_family))
        .route(
            "/api/families/{id}",
            get(get_family).put(update_family).delete(delete_family),
        )
        // Lookup lists
        .route("/api/lookups/{kind}", get(get_lookup))
        // Directory exports
        .route("/api/directory/html", get(directory_html))
        .route("/api/directory/pdf", get(directory_pdf))
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

/// Record per-route request counts and latency
async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    metrics::record_api_request(
        &endpoint,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Run a repository call on the blocking pool
async fn with_repository<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn DirectoryRepository) -> StorageResult<T> + Send + 'static,
{
    let repository = state.repository.clone();
    tokio::task::spawn_blocking(move || f(repository.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("repository task failed: {e}")))?
        .map_err(ApiError::from)
}

// ============================================================================
// Health Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        browser: state.renderer.provisioner_name().to_string(),
        open_sessions: state.renderer.open_sessions(),
    }))
}

/// Prometheus text exposition
async fn metrics_endpoint() -> Response {
    match metrics::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ============================================================================
// PDF Handlers
// ============================================================================

/// Render posted HTML into a PDF attachment
async fn generate_pdf(
    State(state): State<AppState>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable render request");
            return render_error(StatusCode::BAD_REQUEST, MISSING_HTML_MESSAGE);
        }
    };

    match state.renderer.render(request).await {
        Ok(pdf) => pdf_response(pdf),
        Err(e) => render_failure(&e),
    }
}

fn render_failure(error: &RenderError) -> Response {
    if error.is_client_error() {
        render_error(StatusCode::BAD_REQUEST, MISSING_HTML_MESSAGE)
    } else {
        render_error(StatusCode::INTERNAL_SERVER_ERROR, RENDER_FAILED_MESSAGE)
    }
}

fn render_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(RenderErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn pdf_response(pdf: RenderedPdf) -> Response {
    let disposition = pdf.content_disposition();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf.bytes,
    )
        .into_response()
}

// ============================================================================
// Household Handlers
// ============================================================================

/// Search, sort and paginate households
async fn list_families(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, axum::extract::rejection::QueryRejection>,
) -> Result<Json<ApiResponse<Page<Household>>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let page = with_repository(&state, move |repo| repo.list(&query)).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// One household with members, head first
async fn get_family(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Household>>, ApiError> {
    let household = with_repository(&state, move |repo| repo.get(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("household {id} not found")))?;
    Ok(Json(ApiResponse::success(household)))
}

/// Validate and store a new household
async fn create_family(
    State(state): State<AppState>,
    payload: Result<Json<Household>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Household>>), ApiError> {
    let Json(household) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    validate_household(&household)?;
    let household = prepare_for_save(household);

    let stored = with_repository(&state, move |repo| repo.create(&household)).await?;
    tracing::info!(id = ?stored.id, members = stored.members.len(), "Household created");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(stored))))
}

/// Validate and replace a household, reconciling its members
async fn update_family(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<Household>, JsonRejection>,
) -> Result<Json<ApiResponse<Household>>, ApiError> {
    let Json(household) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    validate_household(&household)?;
    let household = prepare_for_save(household);

    let stored = with_repository(&state, move |repo| repo.update(id, &household)).await?;
    tracing::info!(id, members = stored.members.len(), "Household updated");
    Ok(Json(ApiResponse::success(stored)))
}

/// Delete a household and its members
async fn delete_family(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Household>>, ApiError> {
    let removed = with_repository(&state, move |repo| repo.delete(id)).await?;
    if let Some(photo) = removed.photo_url.as_deref() {
        tracing::info!(id, photo, "Deleted household had a photo");
    }
    tracing::info!(id, members = removed.members.len(), "Household deleted");
    Ok(Json(ApiResponse::success(removed)))
}

// ============================================================================
// Lookup Handlers
// ============================================================================

/// Cached option list by name
async fn get_lookup(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ApiResponse<LookupList>>, ApiError> {
    let kind: LookupKind = kind.parse()?;
    let list = state.lookups.get(kind)?;
    Ok(Json(ApiResponse::success(list.as_ref().clone())))
}

// ============================================================================
// Directory Handlers
// ============================================================================

fn parse_language(query: &DirectoryQuery) -> Result<Language, ApiError> {
    match query.language.as_deref() {
        None | Some("") => Ok(Language::default()),
        Some(value) => value.parse().map_err(ApiError::BadRequest),
    }
}

async fn compose_snapshot(state: &AppState, language: Language) -> Result<String, ApiError> {
    let households = with_repository(state, |repo| repo.snapshot()).await?;
    let html = state
        .composer
        .compose(&households, language, &ComposeOptions::today())?;
    metrics::record_document_composed(language.as_str());
    Ok(html)
}

/// Composed directory HTML for preview
async fn directory_html(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
) -> Result<Html<String>, ApiError> {
    let language = parse_language(&query)?;
    let html = compose_snapshot(&state, language).await?;
    Ok(Html(html))
}

/// Directory rendered straight to PDF
async fn directory_pdf(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
) -> Response {
    let language = match parse_language(&query) {
        Ok(language) => language,
        Err(e) => return e.into_response(),
    };
    let html = match compose_snapshot(&state, language).await {
        Ok(html) => html,
        Err(e) => {
            tracing::error!(language = %language, error = ?e, "Directory composition failed");
            return render_error(StatusCode::INTERNAL_SERVER_ERROR, RENDER_FAILED_MESSAGE);
        }
    };

    let filename = directory_filename(language, Local::now().date_naive());
    match state
        .renderer
        .render(RenderRequest::new(html).with_filename(filename))
        .await
    {
        Ok(pdf) => pdf_response(pdf),
        Err(e) => render_failure(&e),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success("test data");
        assert!(response.success);
        assert!(response.data.is_some());
        assert!(response.error.is_none());
    }

    #[test]
    fn test_render_error_body_shape() {
        let body = serde_json::to_value(RenderErrorBody {
            error: MISSING_HTML_MESSAGE.to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "error": "HTML content is required" }));
    }

    #[test]
    fn test_validation_error_response() {
        let mut errors = ValidationError::new();
        errors.add("house_number", "House number is required");

        let response = ApiError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_not_found_maps_to_404() {
        let response = ApiError::from(StorageError::not_found(3)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unknown_lookup_maps_to_404() {
        let err: LookupError = "colours".parse::<LookupKind>().unwrap_err();
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_database_failure_maps_to_500() {
        let err = Error::from(StorageError::Database(rusqlite::Error::InvalidQuery));
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_parse_language() {
        let query = DirectoryQuery {
            language: Some("ml".to_string()),
        };
        assert_eq!(parse_language(&query).unwrap(), Language::Malayalam);
        assert_eq!(
            parse_language(&DirectoryQuery::default()).unwrap(),
            Language::Both
        );
        assert!(parse_language(&DirectoryQuery {
            language: Some("french".to_string())
        })
        .is_err());
    }
}
