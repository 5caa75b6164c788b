use super::traits::{ObjectStore, StorageError};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Object store reached over plain HTTP GET at `<base_url>/<bucket>/<key>`
/// (path-style addressing, as served by S3-compatible gateways).
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpObjectStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, bucket, key.trim_start_matches('/'))
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let url = self.object_url(bucket, key);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(StorageError::PermissionDenied {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            status => Err(StorageError::Status {
                status: status.as_u16(),
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_joins_segments() {
        let store = HttpObjectStore::new("http://minio:9000/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            store.object_url("logs", "/AWSLogs/a.gz"),
            "http://minio:9000/logs/AWSLogs/a.gz"
        );
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", "/logs/a.gz")
            .with_status(200)
            .with_body("payload")
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/logs/b.gz")
            .with_status(404)
            .create_async()
            .await;
        let denied = server
            .mock("GET", "/logs/c.gz")
            .with_status(403)
            .create_async()
            .await;

        let store = HttpObjectStore::new(&server.url(), Duration::from_secs(5)).unwrap();

        assert_eq!(store.get("logs", "a.gz").await.unwrap(), b"payload");
        assert!(matches!(
            store.get("logs", "b.gz").await,
            Err(StorageError::NotFound { .. })
        ));
        assert!(matches!(
            store.get("logs", "c.gz").await,
            Err(StorageError::PermissionDenied { .. })
        ));

        ok.assert_async().await;
        missing.assert_async().await;
        denied.assert_async().await;
    }
}
