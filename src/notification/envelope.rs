use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Event name of a plain object upload.
pub const OBJECT_CREATED_PUT: &str = "ObjectCreated:Put";

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("malformed notification envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("malformed notification message: {0}")]
    Message(#[source] serde_json::Error),

    #[error("notification envelope has no Message field")]
    MissingMessage,
}

/// One storage event, flattened out of the delivery payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub event_name: String,
    pub event_time: DateTime<Utc>,
    pub bucket: String,
    pub key: String,
}

impl NotificationEvent {
    pub fn is_object_put(&self) -> bool {
        self.event_name == OBJECT_CREATED_PUT
    }
}

/// What a single webhook body turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Storage events, in the order they appear in the message.
    Events(Vec<NotificationEvent>),
    /// Subscription handshake; confirming it is left to the operator.
    SubscriptionConfirmation { subscribe_url: Option<String> },
    /// Any other envelope type, e.g. `UnsubscribeConfirmation`.
    Other { kind: String },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Type")]
    kind: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
    #[serde(rename = "SubscribeURL")]
    subscribe_url: Option<String>,
    // Present when the topic delivers the raw message without wrapping it.
    #[serde(rename = "Records")]
    records: Option<Vec<S3Record>>,
}

#[derive(Debug, Deserialize)]
struct S3Message {
    #[serde(rename = "Records", default)]
    records: Vec<S3Record>,
}

#[derive(Debug, Deserialize)]
struct S3Record {
    #[serde(rename = "eventName")]
    event_name: String,
    #[serde(rename = "eventTime")]
    event_time: DateTime<Utc>,
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
}

impl From<S3Record> for NotificationEvent {
    fn from(record: S3Record) -> Self {
        Self {
            event_name: record.event_name,
            event_time: record.event_time,
            bucket: record.s3.bucket.name,
            key: record.s3.object.key,
        }
    }
}

fn into_events(records: Vec<S3Record>) -> Delivery {
    Delivery::Events(records.into_iter().map(NotificationEvent::from).collect())
}

/// Decodes a webhook body.
///
/// The body is a pub/sub envelope whose `Message` field is itself a JSON
/// string holding the storage `Records`.
pub fn parse_delivery(body: &str) -> Result<Delivery, NotificationError> {
    let envelope: Envelope = serde_json::from_str(body).map_err(NotificationError::Envelope)?;

    if let Some(records) = envelope.records {
        return Ok(into_events(records));
    }

    match envelope.kind.as_deref() {
        Some("Notification") | None => {
            let message = envelope.message.ok_or(NotificationError::MissingMessage)?;
            let inner: S3Message =
                serde_json::from_str(&message).map_err(NotificationError::Message)?;
            Ok(into_events(inner.records))
        }
        Some("SubscriptionConfirmation") => Ok(Delivery::SubscriptionConfirmation {
            subscribe_url: envelope.subscribe_url,
        }),
        Some(other) => Ok(Delivery::Other {
            kind: other.to_string(),
        }),
    }
}
