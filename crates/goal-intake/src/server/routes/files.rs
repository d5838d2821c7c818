//! File upload, status and retrieval endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{
    IngestionRecord, PendingView, ProgressView, RecordDetail, RecordListItem, RecordStatus,
    UploadResponse,
};

/// Multipart field carrying the upload
const FILE_FIELD: &str = "file";

/// POST /api/files/upload - Upload a file for async parsing
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::InvalidUpload(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidUpload(format!("Failed to read file: {}", e)))?;

        let record = state.intake().intake(&filename, &data).await?;
        return Ok((StatusCode::CREATED, Json(UploadResponse::from(&record))));
    }

    Err(Error::InvalidUpload("No file provided".to_string()))
}

/// GET /api/files - List all records, newest first
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<RecordListItem>>> {
    let records = state.records().list()?;
    Ok(Json(records.iter().map(RecordListItem::from).collect()))
}

/// GET /api/files/:id/progress - Poll status and progress
pub async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProgressView>> {
    let record = load(&state, id)?;
    Ok(Json(ProgressView::from(&record)))
}

/// GET /api/files/:id - Parsed result once finished, 202 while pending
pub async fn get_file(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response> {
    let record = load(&state, id)?;

    let response = match record.status {
        RecordStatus::Ready | RecordStatus::Failed => {
            Json(RecordDetail::from(&record)).into_response()
        }
        RecordStatus::Received | RecordStatus::Processing => {
            (StatusCode::ACCEPTED, Json(PendingView::from(&record))).into_response()
        }
    };

    Ok(response)
}

/// DELETE /api/files/:id - Remove bytes and record
pub async fn delete_file(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    state.intake().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn load(state: &AppState, id: Uuid) -> Result<IngestionRecord> {
    state.records().get(id)?.ok_or(Error::RecordNotFound(id))
}
