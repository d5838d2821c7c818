//! API routes for the intake server

pub mod files;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{delete, get, post},
    Json, Router,
};

use crate::server::state::AppState;
use crate::types::FormatTag;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Upload - with larger body limit for file uploads
        .route(
            "/files/upload",
            post(files::upload_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/files", get(files::list_files))
        .route("/files/:id", get(files::get_file).delete(files::delete_file))
        .route("/files/:id/progress", get(files::get_progress))
        .route("/files/:id/delete", delete(files::delete_file))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let limits = &state.config().intake;
    let formats: Vec<&str> = limits.allowed_formats.iter().map(FormatTag::as_str).collect();

    Json(serde_json::json!({
        "name": "goal-intake",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "File intake with asynchronous parsing and format-specific summaries",
        "limits": {
            "max_file_size": limits.max_file_size,
            "allowed_formats": formats,
        },
        "queue": state.job_queue().stats(),
        "endpoints": {
            "POST /api/files/upload": "Upload a file (multipart field 'file')",
            "GET /api/files": "List uploaded files",
            "GET /api/files/:id": "Get parsed content (202 while processing)",
            "GET /api/files/:id/progress": "Get processing status and progress",
            "DELETE /api/files/:id": "Delete a file and its parsed content"
        }
    }))
}
