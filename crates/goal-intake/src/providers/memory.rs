//! In-memory blob store

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::error::{Error, Result};

use super::blob_store::{validate_handle, BlobStore};

/// Blob store holding bytes in process memory
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Bytes>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, name: &str, data: &[u8]) -> Result<String> {
        validate_handle(name)?;
        self.blobs.insert(name.to_string(), Bytes::copy_from_slice(data));
        Ok(name.to_string())
    }

    async fn get(&self, handle: &str) -> Result<Vec<u8>> {
        self.blobs
            .get(handle)
            .map(|b| b.value().to_vec())
            .ok_or_else(|| Error::storage(format!("Blob {} not found", handle)))
    }

    async fn exists(&self, handle: &str) -> Result<bool> {
        Ok(self.blobs.contains_key(handle))
    }

    async fn delete(&self, handle: &str) -> Result<()> {
        self.blobs.remove(handle);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_delete() {
        let store = MemoryBlobStore::new();
        let handle = store.put("x.pdf", b"%PDF").await.unwrap();
        assert_eq!(store.get(&handle).await.unwrap(), b"%PDF");
        assert_eq!(store.len(), 1);

        store.delete(&handle).await.unwrap();
        store.delete(&handle).await.unwrap();
        assert!(store.is_empty());
        assert!(store.get(&handle).await.is_err());
    }
}
