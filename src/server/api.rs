use crate::notification::{parse_delivery, Delivery, NotificationEvent};
use crate::pipeline::{Admission, IngestionPipeline};
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Shared state for the webhook API
pub struct AppState {
    pub pipeline: Arc<IngestionPipeline>,
    /// Tracks spawned per-event tasks so shutdown can wait for them.
    pub tasks: TaskTracker,
}

impl AppState {
    pub fn new(pipeline: Arc<IngestionPipeline>) -> Self {
        Self {
            pipeline,
            tasks: TaskTracker::new(),
        }
    }

    /// Runs the watermark over `events` in order, then spawns processing
    /// for the accepted ones. Returns how many were spawned.
    pub fn dispatch(&self, events: Vec<NotificationEvent>) -> usize {
        let mut spawned = 0;

        for event in events {
            if let Admission::Accepted(event) = self.pipeline.admit(event) {
                let pipeline = Arc::clone(&self.pipeline);
                self.tasks.spawn(async move {
                    pipeline.process(event).await;
                });
                spawned += 1;
            }
        }

        spawned
    }

    /// Stops taking new work and waits for spawned tasks. Tasks that have not
    /// reached the fetch stage yet are dropped rather than started.
    pub async fn shutdown(&self) {
        self.tasks.close();
        self.pipeline.close();
        info!(in_flight = self.tasks.len(), "Waiting for event tasks");
        self.tasks.wait().await;
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub watermark: DateTime<Utc>,
    pub in_flight: usize,
}

/// POST /
///
/// Always answers 200 so the notifier never redelivers.
pub async fn receive_notification(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    let body = String::from_utf8_lossy(&body);

    match parse_delivery(&body) {
        Ok(Delivery::Events(events)) => {
            let received = events.len();
            let spawned = state.dispatch(events);
            debug!(received, spawned, "Notification dispatched");
        }
        Ok(Delivery::SubscriptionConfirmation { subscribe_url }) => {
            info!(
                subscribe_url = subscribe_url.as_deref().unwrap_or("-"),
                "Subscription confirmation received; confirm it to start deliveries"
            );
        }
        Ok(Delivery::Other { kind }) => {
            debug!(kind = %kind, "Ignoring notification envelope");
        }
        Err(e) => {
            warn!(error = %e, "Dropping malformed notification");
        }
    }

    StatusCode::OK
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        watermark: state.pipeline.deduplicator().watermark(),
        in_flight: state.tasks.len(),
    })
}
