use super::traits::{ObjectStore, StorageError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Object store backed by a directory tree laid out as `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalFsObjectStore {
    root: PathBuf,
}

impl LocalFsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        for part in [bucket, key] {
            let escapes = Path::new(part)
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
            if part.is_empty() || escapes {
                return Err(StorageError::InvalidKey(format!("{}/{}", bucket, key)));
            }
        }
        Ok(self.root.join(bucket).join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalFsObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(bucket, key)?;

        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => StorageError::Io(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_nested_key() {
        let dir = TempDir::new().unwrap();
        let object_dir = dir.path().join("logs-bucket/AWSLogs/2024/03/05");
        std::fs::create_dir_all(&object_dir).unwrap();
        std::fs::write(object_dir.join("part.log.gz"), b"bytes").unwrap();

        let store = LocalFsObjectStore::new(dir.path());
        let data = store
            .get("logs-bucket", "AWSLogs/2024/03/05/part.log.gz")
            .await
            .unwrap();

        assert_eq!(data, b"bytes");
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = LocalFsObjectStore::new(dir.path());

        let err = store.get("bucket", "nope.gz").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_parent_components_are_rejected() {
        let dir = TempDir::new().unwrap();
        let store = LocalFsObjectStore::new(dir.path());

        let err = store.get("bucket", "../../etc/passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));

        let err = store.get("", "key").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
