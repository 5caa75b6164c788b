use super::envelope::NotificationEvent;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, PoisonError};

/// Admits each notification at most once by event time.
///
/// Holds the time of the newest accepted event. An event is accepted only
/// if it is strictly newer, so redeliveries and stragglers are dropped. Two
/// distinct events sharing a timestamp are indistinguishable here and only
/// the first is kept.
#[derive(Debug)]
pub struct NotificationDeduplicator {
    watermark: Mutex<DateTime<Utc>>,
}

impl NotificationDeduplicator {
    pub fn new(initial: DateTime<Utc>) -> Self {
        Self {
            watermark: Mutex::new(initial),
        }
    }

    /// Starts at the current time: events from before startup are dropped.
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    pub fn accept(&self, event: &NotificationEvent) -> bool {
        self.accept_time(event.event_time)
    }

    /// Compare-and-advance under one lock.
    pub fn accept_time(&self, event_time: DateTime<Utc>) -> bool {
        let mut watermark = self
            .watermark
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if event_time > *watermark {
            *watermark = event_time;
            true
        } else {
            false
        }
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        *self
            .watermark
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
