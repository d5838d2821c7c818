//! Error types for the intake service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for intake operations
pub type Result<T> = std::result::Result<T, Error>;

/// Intake system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Format tag outside the supported set
    #[error("File type {0} is not supported. Allowed types: csv, xlsx, xls, pdf, txt")]
    UnsupportedFormat(String),

    /// Parser failure, already normalized at the parser boundary
    #[error("Error parsing {format} file: {message}")]
    Parse { format: String, message: String },

    /// Upload exceeds the configured size limit
    #[error("File size {size} exceeds maximum limit of {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    /// Upload rejected before any record was created
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// Record not present in the record store
    #[error("Record not found: {0}")]
    RecordNotFound(Uuid),

    /// Blob or record store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a parse error
    pub fn parse(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, "unsupported_type"),
            Error::Parse { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "parse_error"),
            Error::FileTooLarge { .. } => (StatusCode::BAD_REQUEST, "file_too_large"),
            Error::InvalidUpload(_) => (StatusCode::BAD_REQUEST, "invalid_upload"),
            Error::RecordNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        // Internal paths stay in the logs
        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
