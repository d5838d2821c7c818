//! Job queue feeding record ids to the processing worker
//!
//! Delivery is at-least-once from the handler's point of view: recovery on
//! startup may resubmit a record that a previous process already queued.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A processing job for one record
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub record_id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(record_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            record_id,
            submitted_at: Utc::now(),
        }
    }
}

/// Job queue for managing background processing
pub struct JobQueue {
    /// Channel for sending jobs to workers
    sender: mpsc::Sender<Job>,
    /// Buffered job capacity
    capacity: usize,
    /// Jobs submitted but not yet picked up
    queue_size: Arc<AtomicUsize>,
    /// Jobs submitted since startup
    submitted: Arc<AtomicUsize>,
}

impl JobQueue {
    /// Create a new job queue
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Job>) {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);

        let queue = Self {
            sender,
            capacity,
            queue_size: Arc::new(AtomicUsize::new(0)),
            submitted: Arc::new(AtomicUsize::new(0)),
        };

        (queue, receiver)
    }

    /// Submit a record for processing.
    ///
    /// Waits for buffer space when the queue is full; fails only when the
    /// worker has shut down.
    pub async fn submit(&self, record_id: Uuid) -> Result<Uuid> {
        let job = Job::new(record_id);
        let job_id = job.id;

        self.queue_size.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.sender.send(job).await {
            self.queue_size.fetch_sub(1, Ordering::SeqCst);
            tracing::error!("Failed to submit job for record {}: {}", record_id, e);
            return Err(Error::internal("Job queue is closed"));
        }

        self.submitted.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Queued job {} for record {}", job_id, record_id);
        Ok(job_id)
    }

    /// Called by the worker when it takes a job off the channel
    pub fn mark_dequeued(&self) {
        let _ = self
            .queue_size
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pending: self.queue_size.load(Ordering::SeqCst),
            submitted: self.submitted.load(Ordering::SeqCst),
            capacity: self.capacity,
        }
    }
}

/// Queue statistics
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub submitted: usize,
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_delivers_record_id() {
        let (queue, mut receiver) = JobQueue::new(4);
        let record_id = Uuid::new_v4();

        let job_id = queue.submit(record_id).await.unwrap();
        assert_eq!(queue.stats().pending, 1);

        let job = receiver.recv().await.unwrap();
        queue.mark_dequeued();
        assert_eq!(job.id, job_id);
        assert_eq!(job.record_id, record_id);

        let stats = queue.stats();
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.submitted, 1);
        assert_eq!(stats.capacity, 4);
    }

    #[tokio::test]
    async fn test_submit_fails_when_worker_gone() {
        let (queue, receiver) = JobQueue::new(1);
        drop(receiver);

        assert!(queue.submit(Uuid::new_v4()).await.is_err());
        assert_eq!(queue.stats().pending, 0);
    }
}
