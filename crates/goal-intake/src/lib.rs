//! goal-intake: File intake with asynchronous parsing and format-specific summaries
//!
//! Uploaded files are stored as raw bytes, tracked by an ingestion record and
//! parsed in the background into a bounded summary (CSV, Excel, PDF or plain
//! text). Failed records are swept after a configurable retention window.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod server;
pub mod storage;
pub mod types;

pub use config::IntakeConfig;
pub use error::{Error, Result};
pub use ingestion::Parser;
pub use types::{FormatTag, IngestionRecord, ParsedContent, RecordStatus};
