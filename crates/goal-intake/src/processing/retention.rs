//! Retention sweeper for failed records

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::providers::BlobStore;
use crate::storage::RecordStore;

/// Removes failed records, and their bytes, once they pass an age threshold.
///
/// Records in any other status are never touched.
pub struct RetentionSweeper {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    max_age: Duration,
}

impl RetentionSweeper {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>, max_age: Duration) -> Self {
        Self {
            records,
            blobs,
            max_age,
        }
    }

    /// Delete every failed record created before `now - max_age`.
    ///
    /// A record whose bytes or metadata cannot be removed is logged and left
    /// for the next sweep. Returns the number of records removed.
    pub async fn sweep(&self, now: DateTime<Utc>, max_age: Duration) -> Result<usize> {
        let cutoff = now - max_age;
        let expired = self.records.failed_before(cutoff)?;
        let mut removed = 0;

        for record in expired {
            if let Err(e) = self.blobs.delete(&record.stored_name).await {
                tracing::warn!(
                    "Retention: could not delete bytes of record {} ({}): {}",
                    record.id,
                    record.stored_name,
                    e
                );
                continue;
            }

            match self.records.delete(record.id) {
                Ok(true) => {
                    removed += 1;
                    tracing::debug!("Retention: removed failed record {} ({})", record.id, record.original_name);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Retention: could not delete record {}: {}", record.id, e);
                }
            }
        }

        Ok(removed)
    }

    /// Sweep on a fixed interval, forever; the first sweep runs immediately
    pub async fn run(self, interval: std::time::Duration) {
        tracing::info!(
            "Retention sweeper started: failed records older than {}h, every {}s",
            self.max_age.num_hours(),
            interval.as_secs()
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.sweep(Utc::now(), self.max_age).await {
                Ok(0) => tracing::debug!("Retention sweep removed nothing"),
                Ok(n) => tracing::info!("Retention sweep removed {} failed records", n),
                Err(e) => tracing::error!("Retention sweep failed: {}", e),
            }
        }
    }
}
