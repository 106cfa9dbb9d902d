//! In-memory storage provider for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::path::StoragePath;
use crate::provider::StorageProvider;
use rapture_common::{Error, Result};

/// In-memory storage provider.
///
/// Useful for testing. Clones share the same backing map, so a test can
/// keep a handle and inspect what a component stored.
#[derive(Clone, Default)]
pub struct MemoryProvider {
    storage: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryProvider {
    /// Create a new empty memory provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned<T>(_: T) -> Error {
        Error::Storage("Memory storage lock poisoned".to_string())
    }
}

#[async_trait]
impl StorageProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, path: &StoragePath, data: Vec<u8>) -> Result<()> {
        self.storage
            .write()
            .map_err(Self::poisoned)?
            .insert(path.to_string(), data);
        Ok(())
    }

    async fn get(&self, path: &StoragePath) -> Result<Vec<u8>> {
        self.storage
            .read()
            .map_err(Self::poisoned)?
            .get(&path.to_string())
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("File not found: {}", path)))
    }

    async fn exists(&self, path: &StoragePath) -> Result<bool> {
        Ok(self
            .storage
            .read()
            .map_err(Self::poisoned)?
            .contains_key(&path.to_string()))
    }

    async fn delete(&self, path: &StoragePath) -> Result<()> {
        self.storage
            .write()
            .map_err(Self::poisoned)?
            .remove(&path.to_string())
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("File not found: {}", path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_put_get_delete() {
        let provider = MemoryProvider::new();
        let path = StoragePath::parse("sessions/x.json").unwrap();

        provider.put(&path, b"data".to_vec()).await.unwrap();
        assert!(provider.exists(&path).await.unwrap());
        assert_eq!(provider.get(&path).await.unwrap(), b"data");

        provider.delete(&path).await.unwrap();
        assert!(provider.is_empty());
        assert!(provider.get(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_clones_share_storage() {
        let provider = MemoryProvider::new();
        let handle = provider.clone();
        provider
            .put(&StoragePath::parse("a").unwrap(), vec![1])
            .await
            .unwrap();
        assert_eq!(handle.len(), 1);
    }
}
