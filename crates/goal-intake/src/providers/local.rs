//! Local blob store using the filesystem

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

use crate::config::IntakeConfig;
use crate::error::{Error, Result};

use super::blob_store::{validate_handle, BlobStore};

/// Local blob store writing one file per blob
pub struct LocalBlobStore {
    /// Directory to store blobs
    storage_dir: PathBuf,
}

impl LocalBlobStore {
    /// Create a new local blob store
    pub fn new(storage_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&storage_dir)?;
        Ok(Self { storage_dir })
    }

    /// Create from config
    pub fn from_config(config: &IntakeConfig) -> Result<Self> {
        Self::new(config.storage.blob_dir.clone())
    }

    /// Get path for a blob
    fn blob_path(&self, handle: &str) -> Result<PathBuf> {
        validate_handle(handle)?;
        Ok(self.storage_dir.join(handle))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, data: &[u8]) -> Result<String> {
        let path = self.blob_path(name)?;

        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        tracing::debug!("Stored blob {} ({} bytes)", name, data.len());
        Ok(name.to_string())
    }

    async fn get(&self, handle: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(handle)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::storage(format!("Failed to read blob {}: {}", handle, e)))
    }

    async fn exists(&self, handle: &str) -> Result<bool> {
        let path = self.blob_path(handle)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn delete(&self, handle: &str) -> Result<()> {
        let path = self.blob_path(handle)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(format!("Failed to delete blob {}: {}", handle, e))),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.storage_dir.exists())
    }

    fn name(&self) -> &str {
        "local-filesystem"
    }
}
