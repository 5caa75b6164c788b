use crate::config::{load_or_default, Config, ConfigError, StorageBackend};
use crate::ingest::{stream_labels, LogBatchFormatter, LokiClient, SubmitError};
use crate::notification::NotificationDeduplicator;
use crate::pipeline::IngestionPipeline;
use crate::server::{start_server, AppState};
use crate::storage::{HttpObjectStore, LocalFsObjectStore, ObjectFetcher, ObjectStore, StorageError};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("ingestion client error: {0}")]
    Ingest(#[from] SubmitError),

    #[error("invalid listen address '{0}'")]
    ListenAddress(String),

    #[error("web server error: {0}")]
    WebServer(#[from] std::io::Error),
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    run_service(config_path.as_deref()).await.map_err(|e| e.into())
}

async fn run_service(config_path: Option<&Path>) -> Result<(), RunError> {
    match config_path {
        Some(path) => info!(config_path = %path.display(), "Loading configuration"),
        None => info!("No config file found, using defaults and environment"),
    }

    let config = load_or_default(config_path)?;
    let listen: SocketAddr = config
        .server
        .listen
        .parse()
        .map_err(|_| RunError::ListenAddress(config.server.listen.clone()))?;

    let state = build_state(&config)?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
        }
        signal_token.cancel();
    });

    start_server(listen, state, shutdown).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Wires the pipeline described by `config`.
pub fn build_state(config: &Config) -> Result<Arc<AppState>, RunError> {
    let store: Arc<dyn ObjectStore> = match &config.storage.backend {
        StorageBackend::Local { root } => {
            info!(root = %root.display(), "Using local object storage");
            Arc::new(LocalFsObjectStore::new(root.clone()))
        }
        StorageBackend::Http { base_url } => {
            info!(base_url = %base_url, "Using HTTP object storage");
            Arc::new(HttpObjectStore::new(base_url, config.storage.timeout)?)
        }
    };

    let ingest = &config.ingest;
    let client = LokiClient::new(&ingest.endpoint, &ingest.user, &ingest.token, ingest.timeout)?;
    let job = ingest.job_label();
    info!(endpoint = %client.endpoint(), job = %job, level = %ingest.level, "Ingestion target configured");

    let pipeline = IngestionPipeline::new(
        Arc::new(NotificationDeduplicator::starting_now()),
        ObjectFetcher::new(store, config.storage.timeout),
        LogBatchFormatter::new(stream_labels(&job, &ingest.level), ingest.max_batch_entries),
        Arc::new(client),
        config.pipeline.max_in_flight,
        ingest.timeout,
    );

    Ok(Arc::new(AppState::new(Arc::new(pipeline))))
}
