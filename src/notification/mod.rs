pub mod envelope;
pub mod watermark;

pub use envelope::{parse_delivery, Delivery, NotificationError, NotificationEvent, OBJECT_CREATED_PUT};
pub use watermark::NotificationDeduplicator;
