use crate::ingest::{FormatError, IngestSink, LogBatchFormatter, PushRequest, SubmitError};
use crate::notification::{NotificationDeduplicator, NotificationEvent};
use crate::parser::LogLineParser;
use crate::storage::{FetchError, ObjectFetcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Result of running one notification through the watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// At or before the watermark.
    Rejected,
    /// Newer than the watermark but not an object upload.
    Ignored,
    Accepted(NotificationEvent),
}

/// Counters for one processed object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReport {
    pub records: usize,
    pub skipped_lines: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub entries_sent: usize,
}

/// Terminal state of one notification.
#[derive(Debug)]
pub enum EventOutcome {
    Rejected,
    Ignored { event_name: String },
    FetchFailed(FetchError),
    FormatFailed(FormatError),
    /// The pipeline was shut down before the event got a slot.
    Dropped,
    Completed(SubmitReport),
}

/// Moves one storage notification through fetch, parse, format and submit.
///
/// The deduplicator is the only state shared between events. Everything
/// after admission runs independently per event, bounded by `max_in_flight`.
pub struct IngestionPipeline {
    dedup: Arc<NotificationDeduplicator>,
    fetcher: ObjectFetcher,
    parser: LogLineParser,
    formatter: LogBatchFormatter,
    sink: Arc<dyn IngestSink>,
    permits: Semaphore,
    submit_timeout: Duration,
}

impl IngestionPipeline {
    pub fn new(
        dedup: Arc<NotificationDeduplicator>,
        fetcher: ObjectFetcher,
        formatter: LogBatchFormatter,
        sink: Arc<dyn IngestSink>,
        max_in_flight: usize,
        submit_timeout: Duration,
    ) -> Self {
        Self {
            dedup,
            fetcher,
            parser: LogLineParser::default(),
            formatter,
            sink,
            permits: Semaphore::new(max_in_flight.max(1)),
            submit_timeout,
        }
    }

    pub fn deduplicator(&self) -> &NotificationDeduplicator {
        &self.dedup
    }

    /// Stops admitting work into the fetch/submit stages. Events already
    /// holding a slot run to completion; events still waiting are dropped.
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn admit(&self, event: NotificationEvent) -> Admission {
        if !self.dedup.accept(&event) {
            debug!(
                bucket = %event.bucket,
                key = %event.key,
                event_time = %event.event_time,
                "Notification at or before watermark, rejecting"
            );
            return Admission::Rejected;
        }

        if !event.is_object_put() {
            debug!(event_name = %event.event_name, key = %event.key, "Ignoring non-put event");
            return Admission::Ignored;
        }

        Admission::Accepted(event)
    }

    /// Admits and processes a single event.
    pub async fn handle_event(&self, event: NotificationEvent) -> EventOutcome {
        let event_name = event.event_name.clone();
        match self.admit(event) {
            Admission::Rejected => EventOutcome::Rejected,
            Admission::Ignored => EventOutcome::Ignored { event_name },
            Admission::Accepted(event) => self.process(event).await,
        }
    }

    /// Runs the stages after admission for an accepted event.
    pub async fn process(&self, event: NotificationEvent) -> EventOutcome {
        let Ok(_permit) = self.permits.acquire().await else {
            warn!(key = %event.key, "Pipeline closed, dropping event");
            return EventOutcome::Dropped;
        };

        let blob = match self.fetcher.fetch(&event.bucket, &event.key).await {
            Ok(blob) => blob,
            Err(e) => {
                warn!(
                    bucket = %event.bucket,
                    key = %event.key,
                    error = %e,
                    "Failed to fetch log object"
                );
                return EventOutcome::FetchFailed(e);
            }
        };

        let parsed = self.parser.parse_blob(&blob);
        let batches = match self.formatter.format(&parsed.records) {
            Ok(batches) => batches,
            Err(e) => {
                warn!(key = %event.key, error = %e, "Failed to format records");
                return EventOutcome::FormatFailed(e);
            }
        };

        let mut report = SubmitReport {
            records: parsed.records.len(),
            skipped_lines: parsed.skipped,
            batches: batches.len(),
            ..SubmitReport::default()
        };

        // Sequential so entries reach the stream in timestamp order.
        for batch in batches {
            let request = PushRequest::single(batch);
            let entries = request.entry_count();
            match self.submit(&request).await {
                Ok(()) => report.entries_sent += entries,
                Err(e) => {
                    warn!(key = %event.key, entries, error = %e, "Failed to push batch");
                    report.failed_batches += 1;
                }
            }
        }

        info!(
            bucket = %event.bucket,
            key = %event.key,
            records = report.records,
            skipped = report.skipped_lines,
            sent = report.entries_sent,
            failed_batches = report.failed_batches,
            "Processed log object"
        );

        EventOutcome::Completed(report)
    }

    async fn submit(&self, request: &PushRequest) -> Result<(), SubmitError> {
        tokio::time::timeout(self.submit_timeout, self.sink.push(request))
            .await
            .map_err(|_| SubmitError::Timeout(self.submit_timeout))?
    }
}
