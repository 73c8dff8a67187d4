mod error;

#[cfg(test)]
mod tests;

use error::ApiError;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use serde_json::json;
use utoipa::OpenApi;

use std::sync::Arc;

use crate::{
    dto::{
        AppendFilesRequest, AppendFilesResponse, CreateFileRequest, ErrorResponse, FileResponse,
        MessageResponse, NoteResponse, SaveNoteRequest,
    },
    service::{CapsuleService, ServiceError},
};

#[derive(OpenApi)]
#[openapi(
    paths(get_all_files, create_files, get_note, save_note),
    components(schemas(
        FileResponse,
        CreateFileRequest,
        AppendFilesRequest,
        AppendFilesResponse,
        NoteResponse,
        SaveNoteRequest,
        MessageResponse,
        ErrorResponse
    )),
    tags(
        (name = "files", description = "Saved file names"),
        (name = "notes", description = "The capsule note")
    )
)]
pub struct ApiDoc;

fn rejected(rejection: JsonRejection) -> Response {
    match rejection {
        JsonRejection::MissingJsonContentType(_) | JsonRejection::BytesRejection(_) => {
            ApiError::Payload(rejection.status(), rejection.body_text()).into_response()
        }
        _ => ApiError::Validation(rejection.body_text()).into_response(),
    }
}

fn failure(context: &str, e: ServiceError) -> Response {
    match e {
        ServiceError::Validation(message) => ApiError::Validation(message).into_response(),
        ServiceError::Store(e) => {
            tracing::error!("{context}: {e}");
            ApiError::Internal.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/files",
    responses(
        (status = 200, description = "All saved files in insertion order", body = Vec<FileResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "files"
)]
#[debug_handler]
pub async fn get_all_files(State(service): State<Arc<CapsuleService>>) -> Response {
    match service.get_all_files().await {
        Ok(files) => (StatusCode::OK, Json(files)).into_response(),
        Err(e) => failure("failed to get file entries", e),
    }
}

#[utoipa::path(
    post,
    path = "/files",
    request_body = AppendFilesRequest,
    responses(
        (status = 201, description = "File record(s) saved", body = AppendFilesResponse),
        (status = 400, description = "Missing or invalid file name", body = ErrorResponse),
        (status = 413, description = "Body too large", body = ErrorResponse),
        (status = 415, description = "Body is not JSON", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "files"
)]
#[debug_handler]
pub async fn create_files(
    State(service): State<Arc<CapsuleService>>,
    payload: Result<Json<AppendFilesRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejected(rejection),
    };

    match service.create_files(request).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => failure("failed to create file entries", e),
    }
}

#[utoipa::path(
    get,
    path = "/notes",
    responses(
        (status = 200, description = "The saved note, or an empty object when none exists", body = NoteResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_note(State(service): State<Arc<CapsuleService>>) -> Response {
    match service.get_note().await {
        Ok(Some(note)) => (StatusCode::OK, Json(note)).into_response(),
        Ok(None) => (StatusCode::OK, Json(json!({}))).into_response(),
        Err(e) => failure("failed to get note", e),
    }
}

#[utoipa::path(
    post,
    path = "/notes",
    request_body = SaveNoteRequest,
    responses(
        (status = 201, description = "Note saved", body = MessageResponse),
        (status = 400, description = "Missing note content", body = ErrorResponse),
        (status = 413, description = "Body too large", body = ErrorResponse),
        (status = 415, description = "Body is not JSON", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn save_note(
    State(service): State<Arc<CapsuleService>>,
    payload: Result<Json<SaveNoteRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejected(rejection),
    };

    match service.save_note(request).await {
        Ok(message) => (StatusCode::CREATED, Json(message)).into_response(),
        Err(e) => failure("failed to save note", e),
    }
}

/// Fallback for every verb other than GET and POST on the resource paths.
pub async fn method_not_allowed(method: Method) -> Response {
    tracing::debug!("rejected {method} request");
    ApiError::MethodNotAllowed(method).into_response()
}
