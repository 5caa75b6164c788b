use crate::parser::ParsedLogRecord;
use chrono::Utc;
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("wall clock is outside the nanosecond timestamp range")]
    ClockOutOfRange,
}

/// One `(timestamp, line)` pair. Serialized as `["<ns>", "<line>"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub timestamp_ns: i64,
    pub line: String,
}

impl Serialize for BatchEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.timestamp_ns.to_string())?;
        tuple.serialize_element(&self.line)?;
        tuple.end()
    }
}

/// Entries of one stream, submitted as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionBatch {
    pub stream: BTreeMap<String, String>,
    pub values: Vec<BatchEntry>,
}

impl IngestionBatch {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Body of a push request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushRequest {
    pub streams: Vec<IngestionBatch>,
}

impl PushRequest {
    pub fn single(batch: IngestionBatch) -> Self {
        Self {
            streams: vec![batch],
        }
    }

    pub fn entry_count(&self) -> usize {
        self.streams.iter().map(IngestionBatch::len).sum()
    }
}

/// The `job`/`level` label pair identifying this producer's stream.
///
/// Every concurrently running producer needs its own `job`, otherwise their
/// timestamps interleave within one stream.
pub fn stream_labels(job: &str, level: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("job".to_string(), job.to_string()),
        ("level".to_string(), level.to_string()),
    ])
}

/// Turns parsed records into stream batches stamped with the wall clock.
#[derive(Debug, Clone)]
pub struct LogBatchFormatter {
    labels: BTreeMap<String, String>,
    max_entries: usize,
}

impl LogBatchFormatter {
    pub fn new(labels: BTreeMap<String, String>, max_entries: usize) -> Self {
        Self {
            labels,
            max_entries: max_entries.max(1),
        }
    }

    pub fn format(&self, records: &[ParsedLogRecord]) -> Result<Vec<IngestionBatch>, FormatError> {
        self.format_with_clock(records, || Utc::now().timestamp_nanos_opt())
    }

    /// Records are stamped in order and stamps never go backwards, even if
    /// `clock` does. Batches hold at most `max_entries` entries each.
    pub fn format_with_clock<F>(
        &self,
        records: &[ParsedLogRecord],
        mut clock: F,
    ) -> Result<Vec<IngestionBatch>, FormatError>
    where
        F: FnMut() -> Option<i64>,
    {
        let mut last = i64::MIN;
        let mut entries = Vec::with_capacity(records.len());

        for record in records {
            let now = clock().ok_or(FormatError::ClockOutOfRange)?;
            last = last.max(now);
            entries.push(BatchEntry {
                timestamp_ns: last,
                line: record.to_json()?,
            });
        }

        let batches = entries
            .chunks(self.max_entries)
            .map(|chunk| IngestionBatch {
                stream: self.labels.clone(),
                values: chunk.to_vec(),
            })
            .collect();

        Ok(batches)
    }
}
