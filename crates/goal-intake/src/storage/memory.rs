//! In-memory record store

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::record_store::{ApplyOutcome, RecordStore};
use crate::error::{Error, Result};
use crate::types::{IngestionRecord, RecordChange, RecordStatus};

/// Record store backed by a concurrent map; nothing survives a restart
#[derive(Default)]
pub struct MemoryRecordStore {
    records: DashMap<Uuid, IngestionRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect<F>(&self, keep: F) -> Vec<IngestionRecord>
    where
        F: Fn(&IngestionRecord) -> bool,
    {
        let mut records: Vec<IngestionRecord> = self
            .records
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }
}

impl RecordStore for MemoryRecordStore {
    fn create(&self, record: &IngestionRecord) -> Result<()> {
        if self.records.contains_key(&record.id) {
            return Err(Error::storage(format!("Record {} already exists", record.id)));
        }
        self.records.insert(record.id, record.clone());
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<IngestionRecord>> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    fn list(&self) -> Result<Vec<IngestionRecord>> {
        Ok(self.collect(|_| true))
    }

    fn list_by_status(&self, status: RecordStatus) -> Result<Vec<IngestionRecord>> {
        Ok(self.collect(|r| r.status == status))
    }

    fn failed_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<IngestionRecord>> {
        let mut records = self.collect(|r| r.status == RecordStatus::Failed && r.created_at < cutoff);
        records.reverse();
        Ok(records)
    }

    fn apply(&self, id: Uuid, change: RecordChange) -> Result<ApplyOutcome> {
        // The entry guard holds the shard lock across check and write
        let Some(mut entry) = self.records.get_mut(&id) else {
            return Ok(ApplyOutcome::Missing);
        };

        if entry.apply(change) {
            Ok(ApplyOutcome::Applied(entry.clone()))
        } else {
            Ok(ApplyOutcome::Rejected(entry.status))
        }
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.records.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FormatTag;
    use chrono::Duration;

    fn record(created_hours_ago: i64) -> IngestionRecord {
        let mut r = IngestionRecord::received(
            Uuid::new_v4(),
            "data.csv".to_string(),
            "blob.csv".to_string(),
            10,
            FormatTag::Csv,
        );
        r.created_at = Utc::now() - Duration::hours(created_hours_ago);
        r
    }

    #[test]
    fn test_duplicate_create_rejected() {
        let store = MemoryRecordStore::new();
        let r = record(0);
        store.create(&r).unwrap();
        assert!(store.create(&r).is_err());
    }

    #[test]
    fn test_list_newest_first() {
        let store = MemoryRecordStore::new();
        let older = record(5);
        let newer = record(1);
        store.create(&older).unwrap();
        store.create(&newer).unwrap();

        let ids: Vec<Uuid> = store.list().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[test]
    fn test_apply_respects_status() {
        let store = MemoryRecordStore::new();
        let r = record(0);
        store.create(&r).unwrap();

        assert_eq!(
            store.apply(r.id, RecordChange::Fail("x".to_string())).unwrap(),
            ApplyOutcome::Rejected(RecordStatus::Received)
        );
        assert!(matches!(
            store.apply(r.id, RecordChange::BeginProcessing).unwrap(),
            ApplyOutcome::Applied(ref updated) if updated.status == RecordStatus::Processing
        ));
        assert_eq!(
            store.apply(Uuid::new_v4(), RecordChange::BeginProcessing).unwrap(),
            ApplyOutcome::Missing
        );
    }

    #[test]
    fn test_failed_before() {
        let store = MemoryRecordStore::new();
        for hours in [30, 26, 2] {
            let r = record(hours);
            store.create(&r).unwrap();
            store.apply(r.id, RecordChange::BeginProcessing).unwrap();
            store.apply(r.id, RecordChange::Fail("bad".to_string())).unwrap();
        }
        store.create(&record(40)).unwrap();

        let stale = store.failed_before(Utc::now() - Duration::hours(24)).unwrap();
        assert_eq!(stale.len(), 2);
        assert!(stale[0].created_at < stale[1].created_at);
    }
}
