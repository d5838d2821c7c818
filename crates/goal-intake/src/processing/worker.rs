//! Background worker for processing jobs

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use super::job_queue::{Job, JobQueue};
use super::lifecycle::{LifecycleController, ProcessOutcome};

/// Worker handing delivered jobs to the lifecycle controller
pub struct ProcessingWorker {
    controller: Arc<LifecycleController>,
    job_queue: Arc<JobQueue>,
    parallel_jobs: usize,
}

impl ProcessingWorker {
    /// Create a new processing worker
    pub fn new(
        controller: Arc<LifecycleController>,
        job_queue: Arc<JobQueue>,
        parallel_jobs: usize,
    ) -> Self {
        Self {
            controller,
            job_queue,
            parallel_jobs: parallel_jobs.max(1),
        }
    }

    /// Start processing jobs from the queue until every sender is dropped
    pub async fn run(self, mut receiver: mpsc::Receiver<Job>) {
        tracing::info!(
            "Processing worker started: {} parallel jobs",
            self.parallel_jobs
        );

        // Limits concurrent parses
        let semaphore = Arc::new(Semaphore::new(self.parallel_jobs));

        while let Some(job) = receiver.recv().await {
            self.job_queue.mark_dequeued();

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                tracing::error!("Worker semaphore closed, stopping");
                break;
            };

            let controller = self.controller.clone();
            tokio::spawn(async move {
                let _permit = permit;
                Self::handle(&controller, job).await;
            });
        }

        tracing::info!("Processing worker stopped");
    }

    async fn handle(controller: &LifecycleController, job: Job) {
        let record_id = job.record_id;
        let waited = chrono::Utc::now() - job.submitted_at;
        tracing::debug!(
            "Job {} for record {} picked up after {}ms in queue",
            job.id,
            record_id,
            waited.num_milliseconds()
        );

        match controller.process(record_id).await {
            Ok(ProcessOutcome::Ready) => {
                tracing::info!("Job {} completed for record {}", job.id, record_id);
            }
            Ok(ProcessOutcome::Failed) => {
                tracing::warn!("Job {} ended with record {} failed", job.id, record_id);
            }
            Ok(outcome) => {
                tracing::debug!("Job {} for record {} was a no-op: {:?}", job.id, record_id, outcome);
            }
            Err(e) => {
                tracing::error!("Job {} for record {} failed: {}", job.id, record_id, e);
            }
        }
    }
}
