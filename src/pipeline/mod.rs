pub mod runner;

pub use runner::{Admission, EventOutcome, IngestionPipeline, SubmitReport};
