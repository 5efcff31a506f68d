//! # API REST
//!
//! REST transport for the droply file-storage service.
//!
//! Handles:
//! - HTTP endpoints with axum (multipart upload, raw-byte download)
//! - Translation of storage failures to wire status codes
//! - OpenAPI/Swagger documentation
//! - Request-path logging for observability
//!
//! All storage logic lives in `droply-files`; this crate is glue between
//! the wire and the store.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Multipart, Path as AxumPath, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{ErrorDetail, HealthRes, HealthService, StatRes};
use droply_files::{FileStore, StoreError};

/// Application state shared across REST API handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FileStore>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, file_create, file_stat, file_read, file_update, file_delete),
    components(schemas(HealthRes, StatRes, ErrorDetail))
)]
struct ApiDoc;

type ApiError = (StatusCode, Json<ErrorDetail>);

/// Builds the droply REST router.
///
/// Routes follow the service contract exactly; the SwaggerUi merge and the
/// permissive CORS layer are operational conveniences on top.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/file/create", post(file_create))
        .route("/file/:id/stat", get(file_stat))
        .route("/file/:id/read", get(file_read))
        .route("/file/:id/update", post(file_update))
        .route("/file/:id/delete", delete(file_delete))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(log_request_path))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Logs every incoming request path.
async fn log_request_path(req: Request, next: Next) -> Response {
    tracing::info!(method = %req.method(), path = %req.uri().path(), "incoming request");
    next.run(req).await
}

/// Maps a storage failure to its wire status and detail body.
fn error_response(err: StoreError) -> ApiError {
    let (status, detail) = match &err {
        StoreError::InvalidFilename(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "File not found".to_string()),
        StoreError::Ambiguous { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Multiple files found".to_string(),
        ),
        StoreError::NotImplemented => (
            StatusCode::IM_A_TEAPOT,
            "Method not needed for scope of this exercise".to_string(),
        ),
        StoreError::InvalidStorageDir(_) | StoreError::Io(_) => {
            tracing::error!("storage failure: {:?}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
        }
    };
    (status, Json(ErrorDetail::new(detail)))
}

fn bad_request(detail: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorDetail::new(detail)))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/file/create",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Identifier of the stored file", body = String),
        (status = 400, description = "Filename missing or without extension", body = ErrorDetail),
        (status = 500, description = "Internal server error", body = ErrorDetail)
    )
)]
/// Upload a file and receive its opaque identifier
///
/// Expects a multipart form with a `file` field carrying a filename. The
/// extension of that filename becomes part of the storage key; the rest of
/// it is discarded in favour of a freshly minted identifier.
#[axum::debug_handler]
async fn file_create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<String>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_owned).unwrap_or_default();
        let content = field.bytes().await.map_err(|e| bad_request(e.to_string()))?;

        let id = state
            .store
            .create(&filename, &content)
            .map_err(error_response)?;
        return Ok(Json(id));
    }

    Err(bad_request("missing multipart field 'file'"))
}

#[utoipa::path(
    get,
    path = "/file/{id}/stat",
    params(("id" = String, Path, description = "File identifier")),
    responses(
        (status = 200, description = "Metadata of the stored file", body = StatRes),
        (status = 404, description = "File not found", body = ErrorDetail),
        (status = 500, description = "Internal server error", body = ErrorDetail)
    )
)]
/// Report metadata for a stored file
#[axum::debug_handler]
async fn file_stat(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<StatRes>, ApiError> {
    let meta = state.store.stat(&id).map_err(error_response)?;
    Ok(Json(StatRes {
        create_datetime: meta.create_datetime,
        size: meta.size,
        mimetype: meta.mimetype,
        name: meta.name,
    }))
}

#[utoipa::path(
    get,
    path = "/file/{id}/read",
    params(("id" = String, Path, description = "File identifier")),
    responses(
        (status = 200, description = "Raw file bytes", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 404, description = "File not found", body = ErrorDetail),
        (status = 500, description = "Internal server error", body = ErrorDetail)
    )
)]
/// Download a stored file's raw bytes
///
/// The response carries the stored name in `Content-Disposition` and the
/// inferred media type in `Content-Type`.
#[axum::debug_handler]
async fn file_read(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let file = state.store.read(&id).map_err(error_response)?;

    let headers = [
        (header::CONTENT_TYPE, file.mimetype),
        (header::CONTENT_DISPOSITION, file.name),
    ];
    Ok((headers, file.content))
}

#[utoipa::path(
    post,
    path = "/file/{id}/update",
    params(("id" = String, Path, description = "File identifier")),
    responses(
        (status = 418, description = "Update is deliberately unsupported", body = ErrorDetail)
    )
)]
/// Update endpoint that exists only to reject requests
///
/// Stored content is immutable; this always answers 418 and touches no
/// state, whether or not the identifier exists.
#[axum::debug_handler]
async fn file_update(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    match state.store.update(&id) {
        Ok(()) => Ok(StatusCode::OK),
        Err(e) => Err(error_response(e)),
    }
}

#[utoipa::path(
    delete,
    path = "/file/{id}/delete",
    params(("id" = String, Path, description = "File identifier")),
    responses(
        (status = 200, description = "Identifier of the deleted file", body = String),
        (status = 404, description = "File not found", body = ErrorDetail),
        (status = 500, description = "Internal server error", body = ErrorDetail)
    )
)]
/// Delete a stored file by identifier
#[axum::debug_handler]
async fn file_delete(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<String>, ApiError> {
    let id = state.store.delete(&id).map_err(error_response)?;
    Ok(Json(id))
}
