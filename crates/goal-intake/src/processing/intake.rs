//! Intake path: validate an upload, store its bytes, create the record, queue the job

use std::sync::Arc;
use uuid::Uuid;

use super::job_queue::JobQueue;
use crate::config::IntakeLimits;
use crate::error::{Error, Result};
use crate::ingestion::Parser;
use crate::providers::BlobStore;
use crate::storage::RecordStore;
use crate::types::{FormatTag, IngestionRecord};

/// Accepts uploads and removes records on request
pub struct IntakeService {
    limits: IntakeLimits,
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    jobs: Arc<JobQueue>,
}

impl IntakeService {
    pub fn new(
        limits: IntakeLimits,
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        jobs: Arc<JobQueue>,
    ) -> Self {
        Self {
            limits,
            records,
            blobs,
            jobs,
        }
    }

    /// Check name, size and format before anything is stored
    pub fn validate(&self, original_name: &str, size_bytes: u64) -> Result<FormatTag> {
        if original_name.trim().is_empty() {
            return Err(Error::InvalidUpload("No file provided".to_string()));
        }

        if size_bytes > self.limits.max_file_size {
            return Err(Error::FileTooLarge {
                size: size_bytes,
                max: self.limits.max_file_size,
            });
        }

        let tag = FormatTag::from_filename(original_name.trim())?;
        if !self.limits.allows(tag) {
            return Err(Error::UnsupportedFormat(tag.as_str().to_string()));
        }
        Parser::select(tag.as_str())?;

        Ok(tag)
    }

    /// Accept an upload and queue it for parsing.
    ///
    /// Returns the freshly created `received` record. On any failure after
    /// the bytes are stored, what was written is removed again.
    pub async fn intake(&self, original_name: &str, data: &[u8]) -> Result<IngestionRecord> {
        let size_bytes = data.len() as u64;
        let format_tag = self.validate(original_name, size_bytes)?;

        let id = Uuid::new_v4();
        let stored_name = format!("{}.{}", id, format_tag);
        let handle = self.blobs.put(&stored_name, data).await?;

        let record = IngestionRecord::received(
            id,
            original_name.trim().to_string(),
            handle,
            size_bytes,
            format_tag,
        );

        if let Err(e) = self.records.create(&record) {
            self.discard_blob(&record).await;
            return Err(e);
        }

        if let Err(e) = self.jobs.submit(id).await {
            self.discard_blob(&record).await;
            if let Err(cleanup) = self.records.delete(id) {
                tracing::error!("Failed to remove unqueued record {}: {}", id, cleanup);
            }
            return Err(e);
        }

        tracing::info!(
            "Accepted upload {} as record {} ({}, {} bytes)",
            record.original_name,
            id,
            format_tag,
            size_bytes
        );

        Ok(record)
    }

    /// Delete a record in any state: bytes first, then metadata
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let record = self.records.get(id)?.ok_or(Error::RecordNotFound(id))?;

        self.blobs.delete(&record.stored_name).await?;
        if !self.records.delete(id)? {
            return Err(Error::RecordNotFound(id));
        }

        tracing::info!("Deleted record {} ({})", id, record.original_name);
        Ok(())
    }

    async fn discard_blob(&self, record: &IngestionRecord) {
        if let Err(e) = self.blobs.delete(&record.stored_name).await {
            tracing::error!("Failed to remove blob {}: {}", record.stored_name, e);
        }
    }
}
