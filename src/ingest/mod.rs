pub mod batch;
pub mod client;

pub use batch::{stream_labels, BatchEntry, FormatError, IngestionBatch, LogBatchFormatter, PushRequest};
pub use client::{IngestSink, LokiClient, SubmitError};
