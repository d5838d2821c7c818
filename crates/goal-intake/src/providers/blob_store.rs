//! Blob store provider trait for the raw uploaded bytes

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Trait for raw byte storage
///
/// Implementations:
/// - `LocalBlobStore`: Local filesystem directory
/// - `MemoryBlobStore`: Process memory
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `name`
    ///
    /// Returns the handle to read them back with. The bytes are readable as
    /// soon as this returns.
    async fn put(&self, name: &str, data: &[u8]) -> Result<String>;

    /// Retrieve stored bytes
    async fn get(&self, handle: &str) -> Result<Vec<u8>>;

    /// Check if a blob exists
    async fn exists(&self, handle: &str) -> Result<bool>;

    /// Delete a blob; deleting a missing blob succeeds
    async fn delete(&self, handle: &str) -> Result<()>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Reject handles that could escape the store's namespace
pub(crate) fn validate_handle(handle: &str) -> Result<()> {
    if handle.is_empty()
        || handle.contains('/')
        || handle.contains('\\')
        || handle.contains("..")
        || handle.contains('\0')
    {
        return Err(Error::storage(format!("Invalid blob handle '{}'", handle)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_handle() {
        assert!(validate_handle("0b7c5a4e.csv").is_ok());
        assert!(validate_handle("").is_err());
        assert!(validate_handle("../etc/passwd").is_err());
        assert!(validate_handle("a/b.txt").is_err());
        assert!(validate_handle("a\\b.txt").is_err());
    }
}
