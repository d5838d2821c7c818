//! Provider abstractions for raw byte storage
//!
//! A trait-based blob store that allows switching between the local
//! filesystem and process memory.

pub mod blob_store;
pub mod local;
pub mod memory;

pub use blob_store::BlobStore;
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
