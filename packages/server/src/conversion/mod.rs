pub mod pipeline;
pub mod queue;
pub mod recovery;

pub use pipeline::{ConversionOutcome, ConversionPipeline, SkipReason};
pub use queue::{ConversionQueue, QueueClosed, spawn_conversion_workers};
pub use recovery::requeue_processing;
