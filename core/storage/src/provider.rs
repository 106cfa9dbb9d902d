//! Storage provider trait definition.

use async_trait::async_trait;

use crate::path::StoragePath;
use rapture_common::Result;

/// Blob storage backend for session records.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Get the provider name (e.g., "local", "memory").
    fn name(&self) -> &str;

    /// Store `data` at `path`, replacing any previous content.
    ///
    /// # Postconditions
    /// - Missing parent directories are created
    /// - Readers never observe a partially written blob
    async fn put(&self, path: &StoragePath, data: Vec<u8>) -> Result<()>;

    /// Read the blob at `path`.
    ///
    /// # Errors
    /// - `Error::NotFound` if nothing is stored there
    async fn get(&self, path: &StoragePath) -> Result<Vec<u8>>;

    /// Check if a blob exists.
    async fn exists(&self, path: &StoragePath) -> Result<bool>;

    /// Delete a blob.
    ///
    /// # Errors
    /// - `Error::NotFound` if nothing is stored there
    async fn delete(&self, path: &StoragePath) -> Result<()>;
}
