//! Local filesystem storage provider.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::path::StoragePath;
use crate::provider::StorageProvider;
use rapture_common::{Error, Result};

/// Local filesystem storage provider.
///
/// Stores blobs as files under a root directory, readable only by the
/// current user.
pub struct LocalProvider {
    root: PathBuf,
}

impl LocalProvider {
    /// Create a new local provider with the given root directory.
    ///
    /// The root is created lazily on the first write, so constructing a
    /// provider for a fresh install touches nothing on disk.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn to_fs_path(&self, path: &StoragePath) -> PathBuf {
        let mut fs_path = self.root.clone();
        for component in path.components() {
            fs_path.push(component);
        }
        fs_path
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[async_trait]
impl StorageProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn put(&self, path: &StoragePath, data: Vec<u8>) -> Result<()> {
        let fs_path = self.to_fs_path(path);
        let parent = fs_path
            .parent()
            .ok_or_else(|| Error::Storage(format!("No parent directory for {}", path)))?;

        if !fs::try_exists(parent).await? {
            fs::create_dir_all(parent).await?;
            restrict_permissions(parent, 0o700).await?;
        }

        // Write beside the target and rename over it.
        let tmp = parent.join(format!(".{}.{}.tmp", path.name(), Uuid::new_v4().simple()));
        fs::write(&tmp, &data).await?;
        restrict_permissions(&tmp, 0o600).await?;
        if let Err(e) = fs::rename(&tmp, &fs_path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(path = %path, size = data.len(), "Stored blob");
        Ok(())
    }

    async fn get(&self, path: &StoragePath) -> Result<Vec<u8>> {
        let fs_path = self.to_fs_path(path);

        match fs::read(&fs_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("File not found: {}", path)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &StoragePath) -> Result<bool> {
        Ok(fs::try_exists(self.to_fs_path(path)).await?)
    }

    async fn delete(&self, path: &StoragePath) -> Result<()> {
        let fs_path = self.to_fs_path(path);

        match fs::remove_file(&fs_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("File not found: {}", path)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_put_get() {
        let temp = TempDir::new().unwrap();
        let provider = LocalProvider::new(temp.path());
        let path = StoragePath::parse("sessions/one.json").unwrap();

        provider.put(&path, b"hello".to_vec()).await.unwrap();
        assert_eq!(provider.get(&path).await.unwrap(), b"hello");

        provider.put(&path, b"replaced".to_vec()).await.unwrap();
        assert_eq!(provider.get(&path).await.unwrap(), b"replaced");

        // No temp files left behind
        let entries = std::fs::read_dir(temp.path().join("sessions")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_local_missing() {
        let temp = TempDir::new().unwrap();
        let provider = LocalProvider::new(temp.path().join("not-created-yet"));
        let path = StoragePath::parse("sessions/none.json").unwrap();

        assert!(!provider.exists(&path).await.unwrap());
        assert!(matches!(provider.get(&path).await, Err(Error::NotFound(_))));
        assert!(matches!(provider.delete(&path).await, Err(Error::NotFound(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let provider = LocalProvider::new(temp.path());
        let path = StoragePath::parse("sessions/private.json").unwrap();
        provider.put(&path, vec![1, 2, 3]).await.unwrap();

        let mode = std::fs::metadata(temp.path().join("sessions/private.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_local_delete() {
        let temp = TempDir::new().unwrap();
        let provider = LocalProvider::new(temp.path());
        let path = StoragePath::parse("a.bin").unwrap();

        provider.put(&path, vec![0]).await.unwrap();
        provider.delete(&path).await.unwrap();
        assert!(!provider.exists(&path).await.unwrap());
    }
}
