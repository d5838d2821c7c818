//! Background processing: intake, job queue, worker, lifecycle and retention

mod intake;
mod job_queue;
mod lifecycle;
mod retention;
mod worker;

pub use intake::IntakeService;
pub use job_queue::{Job, JobQueue, QueueStats};
pub use lifecycle::{
    LifecycleController, ProcessOutcome, INTERRUPTED_MESSAGE, PROGRESS_BYTES_LOADED,
    PROGRESS_PARSER_SELECTED,
};
pub use retention::RetentionSweeper;
pub use worker::ProcessingWorker;
