//! Record store abstraction

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::types::{IngestionRecord, RecordChange, RecordStatus};

/// Result of a compare-and-set on a record's status
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The change was written; carries the updated record
    Applied(IngestionRecord),
    /// The record exists but was not in the expected status
    Rejected(RecordStatus),
    /// No record with this id
    Missing,
}

/// Durable metadata storage for ingestion records.
///
/// `apply` is the only way lifecycle fields change: the store checks the
/// record's current status against [`RecordChange::expected_status`] and
/// writes the change atomically with that check.
pub trait RecordStore: Send + Sync {
    /// Insert a new record
    fn create(&self, record: &IngestionRecord) -> Result<()>;

    fn get(&self, id: Uuid) -> Result<Option<IngestionRecord>>;

    /// All records, newest first
    fn list(&self) -> Result<Vec<IngestionRecord>>;

    fn list_by_status(&self, status: RecordStatus) -> Result<Vec<IngestionRecord>>;

    /// Failed records created strictly before `cutoff`
    fn failed_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<IngestionRecord>>;

    /// Compare-and-set a lifecycle change
    fn apply(&self, id: Uuid, change: RecordChange) -> Result<ApplyOutcome>;

    /// Delete a record; returns whether it existed
    fn delete(&self, id: Uuid) -> Result<bool>;
}
