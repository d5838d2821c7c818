//! Storage module for ingestion record metadata
//!
//! Provides the record store trait with SQLite and in-memory backends.

mod database;
mod memory;
mod record_store;

pub use database::SqliteRecordStore;
pub use memory::MemoryRecordStore;
pub use record_store::{ApplyOutcome, RecordStore};
