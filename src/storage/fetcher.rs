use super::traits::{ObjectStore, StorageError};
use flate2::read::MultiGzDecoder;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("access to {bucket}/{key} denied")]
    PermissionDenied { bucket: String, key: String },

    #[error("failed to decompress {bucket}/{key}: {source}")]
    Decompression {
        bucket: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fetching {bucket}/{key} timed out after {timeout:?}")]
    Timeout {
        bucket: String,
        key: String,
        timeout: Duration,
    },

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for FetchError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { bucket, key } => FetchError::NotFound { bucket, key },
            StorageError::PermissionDenied { bucket, key } => {
                FetchError::PermissionDenied { bucket, key }
            }
            other => FetchError::Storage(other),
        }
    }
}

/// Decompressed text of one log object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLogBlob {
    text: String,
}

impl RawLogBlob {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Retrieves gzip-compressed log objects and returns their text.
#[derive(Clone)]
pub struct ObjectFetcher {
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl ObjectFetcher {
    pub fn new(store: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Either the whole object is returned or nothing is.
    pub async fn fetch(&self, bucket: &str, key: &str) -> Result<RawLogBlob, FetchError> {
        let compressed = tokio::time::timeout(self.timeout, self.store.get(bucket, key))
            .await
            .map_err(|_| FetchError::Timeout {
                bucket: bucket.to_string(),
                key: key.to_string(),
                timeout: self.timeout,
            })??;

        let text = gunzip(&compressed).map_err(|source| FetchError::Decompression {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        })?;

        debug!(
            bucket = %bucket,
            key = %key,
            compressed_bytes = compressed.len(),
            text_bytes = text.len(),
            "Fetched log object"
        );

        Ok(RawLogBlob::new(text))
    }
}

/// Decodes every gzip member in `data` into UTF-8 text.
pub fn gunzip(data: &[u8]) -> Result<String, std::io::Error> {
    let mut text = String::new();
    MultiGzDecoder::new(data).read_to_string(&mut text)?;
    Ok(text)
}
