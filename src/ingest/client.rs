use super::batch::PushRequest;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ingestion endpoint returned error status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("push timed out after {0:?}")]
    Timeout(Duration),
}

/// Destination for formatted batches.
#[async_trait]
pub trait IngestSink: Send + Sync {
    async fn push(&self, request: &PushRequest) -> Result<(), SubmitError>;
}

/// HTTP client for a Loki-compatible push endpoint.
#[derive(Debug, Clone)]
pub struct LokiClient {
    endpoint: String,
    user: String,
    token: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl LokiClient {
    pub fn new(
        endpoint: &str,
        user: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            user: user.to_string(),
            token: token.to_string(),
            timeout,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl IngestSink for LokiClient {
    async fn push(&self, request: &PushRequest) -> Result<(), SubmitError> {
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.token))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SubmitError::Timeout(self.timeout)
                } else {
                    SubmitError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(SubmitError::Rejected {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}
