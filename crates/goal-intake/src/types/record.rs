//! Ingestion record and its lifecycle transitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{FormatTag, ParsedContent};

/// Highest progress value a running parse may report; 100 is reserved for `Ready`
pub const MAX_RUNNING_PROGRESS: u8 = 99;

/// Lifecycle status of an uploaded file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Bytes stored, job submitted
    Received,
    /// A worker is parsing the file
    Processing,
    /// Parsed successfully
    Ready,
    /// Parsing failed
    Failed,
}

impl RecordStatus {
    /// `Ready` and `Failed` have no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// Parse the stored representation
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "received" => Some(Self::Received),
            "processing" => Some(Self::Processing),
            "ready" => Some(Self::Ready),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mutation of the lifecycle fields.
///
/// Stores apply changes through a status compare-and-set; only the lifecycle
/// controller constructs them.
#[derive(Debug, Clone)]
pub enum RecordChange {
    /// `received -> processing`
    BeginProcessing,
    /// `processing -> processing`, progress only moves forward
    Progress(u8),
    /// `processing -> ready`
    Complete(ParsedContent),
    /// `processing -> failed`
    Fail(String),
}

impl RecordChange {
    /// Status the record must be in for the change to apply
    pub fn expected_status(&self) -> RecordStatus {
        match self {
            Self::BeginProcessing => RecordStatus::Received,
            Self::Progress(_) | Self::Complete(_) | Self::Fail(_) => RecordStatus::Processing,
        }
    }
}

/// The tracked entity for one uploaded file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestionRecord {
    /// Unique record ID
    pub id: Uuid,
    /// Filename as uploaded
    pub original_name: String,
    /// Blob-store handle for the raw bytes
    pub stored_name: String,
    /// File size in bytes
    pub size_bytes: u64,
    /// Parser-selecting format tag
    pub format_tag: FormatTag,
    pub status: RecordStatus,
    /// Percentage in [0, 100]
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ParsedContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IngestionRecord {
    /// Create a freshly received record
    pub fn received(
        id: Uuid,
        original_name: String,
        stored_name: String,
        size_bytes: u64,
        format_tag: FormatTag,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            original_name,
            stored_name,
            size_bytes,
            format_tag,
            status: RecordStatus::Received,
            progress: 0,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a lifecycle change in place.
    ///
    /// Returns `false` without touching the record when its status does not
    /// match the status the change expects.
    pub fn apply(&mut self, change: RecordChange) -> bool {
        if self.status != change.expected_status() {
            return false;
        }

        match change {
            RecordChange::BeginProcessing => {
                self.status = RecordStatus::Processing;
                self.progress = 0;
            }
            RecordChange::Progress(value) => {
                self.progress = self.progress.max(value.min(MAX_RUNNING_PROGRESS));
            }
            RecordChange::Complete(content) => {
                self.status = RecordStatus::Ready;
                self.progress = 100;
                self.result = Some(content);
                self.error = None;
            }
            RecordChange::Fail(message) => {
                self.status = RecordStatus::Failed;
                self.result = None;
                self.error = Some(message);
            }
        }

        self.updated_at = Utc::now();
        true
    }

    /// Check the cross-field invariants
    pub fn is_consistent(&self) -> bool {
        let outcome_matches = match self.status {
            RecordStatus::Ready => self.result.is_some() && self.error.is_none(),
            RecordStatus::Failed => self.result.is_none() && self.error.is_some(),
            RecordStatus::Received | RecordStatus::Processing => {
                self.result.is_none() && self.error.is_none()
            }
        };
        let progress_matches = (self.progress == 100) == (self.status == RecordStatus::Ready);

        outcome_matches && progress_matches && self.progress <= 100
    }
}
