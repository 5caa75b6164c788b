use crate::server::api::{health_check, receive_notification, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(receive_notification))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the webhook until `shutdown` is cancelled, then wait for event
/// tasks that already hold a pipeline slot.
pub async fn start_server(
    listen_addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> Result<(), std::io::Error> {
    let app = router(Arc::clone(&state));

    info!(addr = %listen_addr, "Starting notification webhook server");

    let listener = TcpListener::bind(listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            info!("Webhook server shutting down gracefully");
        })
        .await?;

    state.shutdown().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{stream_labels, IngestSink, LogBatchFormatter, PushRequest, SubmitError};
    use crate::notification::{NotificationDeduplicator, NotificationEvent};
    use crate::pipeline::IngestionPipeline;
    use crate::storage::{InMemoryObjectStore, ObjectFetcher, ObjectStore, StorageError};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    #[derive(Default)]
    struct CountingSink {
        entries: Mutex<usize>,
    }

    #[async_trait]
    impl IngestSink for CountingSink {
        async fn push(&self, request: &PushRequest) -> Result<(), SubmitError> {
            *self.entries.lock().unwrap() += request.entry_count();
            Ok(())
        }
    }

    /// Delays every read and signals when one has started.
    struct SlowStore {
        inner: InMemoryObjectStore,
        started: Notify,
    }

    #[async_trait]
    impl ObjectStore for SlowStore {
        async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
            self.started.notify_one();
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.inner.get(bucket, key).await
        }
    }

    fn state_with(
        store: Arc<dyn ObjectStore>,
        sink: Arc<CountingSink>,
        max_in_flight: usize,
    ) -> Arc<AppState> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let pipeline = IngestionPipeline::new(
            Arc::new(NotificationDeduplicator::new(start)),
            ObjectFetcher::new(store, Duration::from_secs(5)),
            LogBatchFormatter::new(stream_labels("test", "info"), 100),
            sink,
            max_in_flight,
            Duration::from_secs(5),
        );
        Arc::new(AppState::new(Arc::new(pipeline)))
    }

    fn state(store: Arc<InMemoryObjectStore>, sink: Arc<CountingSink>) -> Arc<AppState> {
        state_with(store, sink, 4)
    }

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn put_event(key: &str, second: u32) -> NotificationEvent {
        NotificationEvent {
            event_name: "ObjectCreated:Put".to_string(),
            event_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, second).unwrap(),
            bucket: "b".to_string(),
            key: key.to_string(),
        }
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "text/plain; charset=UTF-8")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_malformed_body_still_acknowledged() {
        let app = router(state(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(CountingSink::default()),
        ));

        let response = app.oneshot(post("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_utf8_still_acknowledged() {
        let app = router(state(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(CountingSink::default()),
        ));

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(vec![0xff, 0xfe, 0x00]))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_object_still_acknowledged() {
        let store = Arc::new(InMemoryObjectStore::new());
        let sink = Arc::new(CountingSink::default());
        let state = state(store.clone(), sink.clone());
        let app = router(Arc::clone(&state));

        let message = serde_json::json!({
            "Records": [{
                "eventName": "ObjectCreated:Put",
                "eventTime": "2024-01-01T00:00:05Z",
                "s3": { "bucket": { "name": "b" }, "object": { "key": "gone.gz" } }
            }]
        });
        let body = serde_json::json!({ "Type": "Notification", "Message": message.to_string() });

        let response = app.oneshot(post(&body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        state.tasks.close();
        state.tasks.wait().await;
        assert_eq!(store.read_count(), 1);
        assert_eq!(*sink.entries.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_health_reports_watermark() {
        let app = router(state(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(CountingSink::default()),
        ));

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(health["status"], "ok");
        assert_eq!(health["watermark"], "2024-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_shutdown_drops_events_waiting_for_a_slot() {
        const LINE: &str = "http 2023-01-01T00:00:00.000000Z my-elb 1.2.3.4:80 5.6.7.8:80 0.001 0.002 0.003 200 200 100 200 \"GET http://x/ HTTP/1.1\" \"curl/7\" - - arn:target \"trace-1\" 1 2023-01-01T00:00:00.000000Z \"forward\" \"-\" \"-\" \"arn:tg\" \"200\"\n";

        let store = Arc::new(SlowStore {
            inner: InMemoryObjectStore::new(),
            started: Notify::new(),
        });
        for key in ["first.gz", "second.gz"] {
            store.inner.put("b", key, gzip(LINE));
        }
        let sink = Arc::new(CountingSink::default());
        let state = state_with(store.clone(), sink.clone(), 1);

        assert_eq!(state.dispatch(vec![put_event("first.gz", 1)]), 1);
        store.started.notified().await;
        assert_eq!(state.dispatch(vec![put_event("second.gz", 2)]), 1);

        state.shutdown().await;

        assert_eq!(store.inner.read_count(), 1);
        assert_eq!(*sink.entries.lock().unwrap(), 1);
        assert!(state.tasks.is_empty());
    }
}
