//! Caller-facing views of an ingestion record

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{FormatTag, IngestionRecord, ParsedContent, RecordStatus};

/// Returned by a successful upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub id: Uuid,
    pub message: String,
    pub status: RecordStatus,
}

impl From<&IngestionRecord> for UploadResponse {
    fn from(record: &IngestionRecord) -> Self {
        Self {
            id: record.id,
            message: "File uploaded successfully".to_string(),
            status: record.status,
        }
    }
}

/// Polling view
#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    pub id: Uuid,
    pub status: RecordStatus,
    pub progress: u8,
}

impl From<&IngestionRecord> for ProgressView {
    fn from(record: &IngestionRecord) -> Self {
        Self {
            id: record.id,
            status: record.status,
            progress: record.progress,
        }
    }
}

/// Entry in the file listing
#[derive(Debug, Clone, Serialize)]
pub struct RecordListItem {
    pub id: Uuid,
    pub original_name: String,
    pub size_bytes: u64,
    pub format_tag: FormatTag,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&IngestionRecord> for RecordListItem {
    fn from(record: &IngestionRecord) -> Self {
        Self {
            id: record.id,
            original_name: record.original_name.clone(),
            size_bytes: record.size_bytes,
            format_tag: record.format_tag,
            status: record.status,
            created_at: record.created_at,
        }
    }
}

/// Full record, with the result only when ready and the error only when failed
#[derive(Debug, Clone, Serialize)]
pub struct RecordDetail {
    pub id: Uuid,
    pub original_name: String,
    pub size_bytes: u64,
    pub format_tag: FormatTag,
    pub status: RecordStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ParsedContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&IngestionRecord> for RecordDetail {
    fn from(record: &IngestionRecord) -> Self {
        Self {
            id: record.id,
            original_name: record.original_name.clone(),
            size_bytes: record.size_bytes,
            format_tag: record.format_tag,
            status: record.status,
            progress: record.progress,
            result: match record.status {
                RecordStatus::Ready => record.result.clone(),
                _ => None,
            },
            error: match record.status {
                RecordStatus::Failed => record.error.clone(),
                _ => None,
            },
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Returned while a record is still being processed
#[derive(Debug, Clone, Serialize)]
pub struct PendingView {
    pub message: String,
    pub status: RecordStatus,
    pub progress: u8,
}

impl From<&IngestionRecord> for PendingView {
    fn from(record: &IngestionRecord) -> Self {
        Self {
            message: "File upload or processing in progress. Please try again later.".to_string(),
            status: record.status,
            progress: record.progress,
        }
    }
}
