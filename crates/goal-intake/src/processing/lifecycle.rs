//! Lifecycle controller driving records from `received` to `ready` or `failed`
//!
//! This is the only writer of status, progress, result and error. Every
//! transition is a compare-and-set in the record store, so duplicate or late
//! job deliveries observe a status they do not own and turn into no-ops.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ingestion::Parser;
use crate::providers::BlobStore;
use crate::storage::{ApplyOutcome, RecordStore};
use crate::types::{IngestionRecord, ParsedContent, RecordChange, RecordStatus};

/// Progress once the raw bytes are loaded
pub const PROGRESS_BYTES_LOADED: u8 = 10;

/// Progress once the parser is selected
pub const PROGRESS_PARSER_SELECTED: u8 = 30;

/// Error stored on records a previous process left mid-parse
pub const INTERRUPTED_MESSAGE: &str = "processing interrupted before completion";

/// How a processing invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The record is now `ready`
    Ready,
    /// The record is now `failed`
    Failed,
    /// The record was not ours to drive; carries the status observed
    Skipped(RecordStatus),
    /// The record no longer exists
    Missing,
}

/// Single owner of record lifecycle mutations
pub struct LifecycleController {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl LifecycleController {
    /// Create a new controller over the given stores
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { records, blobs }
    }

    /// `received -> processing`, resetting progress to 0
    pub fn begin_processing(&self, id: Uuid) -> Result<ApplyOutcome> {
        self.records.apply(id, RecordChange::BeginProcessing)
    }

    /// Raise progress while processing; never lowers it and never reaches 100
    pub fn report_progress(&self, id: Uuid, progress: u8) -> Result<ApplyOutcome> {
        self.records.apply(id, RecordChange::Progress(progress))
    }

    /// `processing -> ready` with the parsed content
    pub fn complete(&self, id: Uuid, content: ParsedContent) -> Result<ApplyOutcome> {
        self.records.apply(id, RecordChange::Complete(content))
    }

    /// `processing -> failed` with a client-visible message
    pub fn fail(&self, id: Uuid, message: impl Into<String>) -> Result<ApplyOutcome> {
        self.records.apply(id, RecordChange::Fail(message.into()))
    }

    /// Handle one delivered job for `id`.
    ///
    /// Parse failures end in `failed` and are reported as `Ok(Failed)`; only
    /// record store failures come back as `Err`.
    pub async fn process(&self, id: Uuid) -> Result<ProcessOutcome> {
        let record = match self.begin_processing(id)? {
            ApplyOutcome::Applied(record) => record,
            ApplyOutcome::Rejected(status) => {
                tracing::debug!("Skipping job for record {}: already {}", id, status);
                return Ok(ProcessOutcome::Skipped(status));
            }
            ApplyOutcome::Missing => {
                tracing::warn!("Record {} not found, discarding job", id);
                return Ok(ProcessOutcome::Missing);
            }
        };

        tracing::info!(
            "Processing {} ({}, {} bytes) for record {}",
            record.original_name,
            record.format_tag,
            record.size_bytes,
            id
        );

        match self.parse_record(&record).await {
            Ok(ParseStep::Stopped(outcome)) => Ok(outcome),
            Ok(ParseStep::Parsed(content)) => {
                let kind = content.kind();
                let outcome = settle(id, self.complete(id, content)?, ProcessOutcome::Ready);
                if outcome == ProcessOutcome::Ready {
                    tracing::info!("Record {} ready ({} summary)", id, kind);
                }
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!("Processing failed for {} ({}): {}", record.original_name, id, e);
                Ok(settle(id, self.fail(id, e.to_string())?, ProcessOutcome::Failed))
            }
        }
    }

    /// Load bytes, select the parser and run it off the async runtime.
    ///
    /// Stops before parsing once a progress report finds the record gone or
    /// no longer `processing`.
    async fn parse_record(&self, record: &IngestionRecord) -> Result<ParseStep> {
        let data = self.blobs.get(&record.stored_name).await?;
        if let Some(outcome) = self.advance(record.id, PROGRESS_BYTES_LOADED)? {
            return Ok(ParseStep::Stopped(outcome));
        }

        let parser = Parser::select(record.format_tag.as_str())?;
        if let Some(outcome) = self.advance(record.id, PROGRESS_PARSER_SELECTED)? {
            return Ok(ParseStep::Stopped(outcome));
        }
        tracing::debug!("Running {} parser for record {}", parser.name(), record.id);

        run_blocking(move || parser.parse(&data))
            .await
            .map(ParseStep::Parsed)
    }

    /// Report a milestone; `Some` carries the outcome when the record is no longer ours
    fn advance(&self, id: Uuid, progress: u8) -> Result<Option<ProcessOutcome>> {
        match self.report_progress(id, progress)? {
            ApplyOutcome::Applied(_) => Ok(None),
            ApplyOutcome::Rejected(status) => {
                tracing::debug!("Abandoning record {} mid-parse: already {}", id, status);
                Ok(Some(ProcessOutcome::Skipped(status)))
            }
            ApplyOutcome::Missing => {
                tracing::warn!("Record {} was deleted during processing", id);
                Ok(Some(ProcessOutcome::Missing))
            }
        }
    }

    /// Settle records a previous process left behind.
    ///
    /// Records stuck in `processing` are failed; the ids of records still
    /// `received` are returned, oldest first, for resubmission.
    pub fn recover_interrupted(&self) -> Result<Vec<Uuid>> {
        let interrupted = self.records.list_by_status(RecordStatus::Processing)?;
        for record in &interrupted {
            if let ApplyOutcome::Applied(_) = self.fail(record.id, INTERRUPTED_MESSAGE)? {
                tracing::warn!(
                    "Marked interrupted record {} ({}) as failed",
                    record.id,
                    record.original_name
                );
            }
        }

        let mut pending = self.records.list_by_status(RecordStatus::Received)?;
        pending.reverse();

        if !interrupted.is_empty() || !pending.is_empty() {
            tracing::info!(
                "Recovery: {} interrupted records failed, {} pending records to resubmit",
                interrupted.len(),
                pending.len()
            );
        }

        Ok(pending.into_iter().map(|r| r.id).collect())
    }
}

/// Where parsing a record got to
enum ParseStep {
    Parsed(ParsedContent),
    Stopped(ProcessOutcome),
}

/// Run a parser on the blocking pool; a panic becomes an internal error
async fn run_blocking<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| Error::internal(format!("Parser task failed: {}", e)))?
}

/// Map the final compare-and-set onto the invocation outcome
fn settle(id: Uuid, outcome: ApplyOutcome, applied: ProcessOutcome) -> ProcessOutcome {
    match outcome {
        ApplyOutcome::Applied(_) => applied,
        ApplyOutcome::Rejected(status) => {
            tracing::debug!("Dropping duplicate result for record {}: already {}", id, status);
            ProcessOutcome::Skipped(status)
        }
        ApplyOutcome::Missing => {
            tracing::warn!("Record {} was deleted during processing", id);
            ProcessOutcome::Missing
        }
    }
}
