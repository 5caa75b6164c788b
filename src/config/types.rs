use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub token: String,
    /// Stream `job` label. Defaults to `elb2loki-<hostname>`.
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(with = "humantime_serde", default = "default_ingest_timeout")]
    pub timeout: Duration,
    #[serde(default = "default_max_batch_entries")]
    pub max_batch_entries: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            user: String::new(),
            token: String::new(),
            job: None,
            level: default_level(),
            timeout: default_ingest_timeout(),
            max_batch_entries: default_max_batch_entries(),
        }
    }
}

impl IngestConfig {
    pub fn job_label(&self) -> String {
        if let Some(job) = &self.job {
            return job.clone();
        }

        let host = hostname::get()
            .ok()
            .and_then(|h| h.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "localhost".to_string());
        format!("elb2loki-{}", host)
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_ingest_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_batch_entries() -> usize {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(flatten)]
    pub backend: StorageBackend,
    #[serde(with = "humantime_serde", default = "default_storage_timeout")]
    pub timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local {
                root: PathBuf::from("/var/lib/elb2loki/buckets"),
            },
            timeout: default_storage_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageBackend {
    /// Objects under `<root>/<bucket>/<key>`.
    Local { root: PathBuf },
    /// Objects at `<base_url>/<bucket>/<key>`.
    Http { base_url: String },
}

fn default_storage_timeout() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
        }
    }
}

fn default_max_in_flight() -> usize {
    64
}
