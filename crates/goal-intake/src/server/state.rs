//! Application state for the intake server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::IntakeConfig;
use crate::error::Result;
use crate::processing::{
    IntakeService, JobQueue, LifecycleController, ProcessingWorker, RetentionSweeper,
};
use crate::providers::{BlobStore, LocalBlobStore};
use crate::storage::{RecordStore, SqliteRecordStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: IntakeConfig,
    /// Ingestion record metadata
    records: Arc<dyn RecordStore>,
    /// Raw uploaded bytes
    blobs: Arc<dyn BlobStore>,
    /// Upload and delete entry points
    intake: IntakeService,
    /// Job queue for async processing
    job_queue: Arc<JobQueue>,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create application state backed by SQLite and the local filesystem
    pub async fn new(config: IntakeConfig) -> Result<Self> {
        tracing::info!("Initializing intake application state...");

        if let Some(parent) = config.storage.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let records = Arc::new(SqliteRecordStore::new(&config.storage.database_path)?);
        tracing::info!("Record store at {}", config.storage.database_path.display());

        let blobs = Arc::new(LocalBlobStore::from_config(&config)?);
        tracing::info!("Blob store at {}", config.storage.blob_dir.display());

        Self::with_stores(config, records, blobs).await
    }

    /// Create application state over the given stores.
    ///
    /// Starts the processing worker and the retention sweeper, then settles
    /// records left behind by a previous run.
    pub async fn with_stores(
        config: IntakeConfig,
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Result<Self> {
        tracing::info!("Using {} blob store", blobs.name());

        let (job_queue, receiver) = JobQueue::new(config.processing.queue_capacity);
        let job_queue = Arc::new(job_queue);

        let controller = Arc::new(LifecycleController::new(records.clone(), blobs.clone()));
        let parallel_jobs = config.processing.effective_parallel_jobs();
        tracing::info!(
            "Job queue initialized (capacity {}, {} parallel jobs)",
            config.processing.queue_capacity,
            parallel_jobs
        );

        // Start background worker
        let worker = ProcessingWorker::new(controller.clone(), job_queue.clone(), parallel_jobs);
        tokio::spawn(async move {
            worker.run(receiver).await;
        });

        let sweeper = RetentionSweeper::new(
            records.clone(),
            blobs.clone(),
            config.retention.max_age(),
        );
        let sweep_interval = config.retention.sweep_interval();
        tokio::spawn(async move {
            sweeper.run(sweep_interval).await;
        });

        for record_id in controller.recover_interrupted()? {
            job_queue.submit(record_id).await?;
        }

        let intake = IntakeService::new(
            config.intake.clone(),
            records.clone(),
            blobs.clone(),
            job_queue.clone(),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                records,
                blobs,
                intake,
                job_queue,
                ready: RwLock::new(true),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &IntakeConfig {
        &self.inner.config
    }

    /// Get the record store
    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.inner.records
    }

    /// Get the blob store
    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.inner.blobs
    }

    /// Get the intake service
    pub fn intake(&self) -> &IntakeService {
        &self.inner.intake
    }

    /// Get job queue
    pub fn job_queue(&self) -> &Arc<JobQueue> {
        &self.inner.job_queue
    }

    /// Check if ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
