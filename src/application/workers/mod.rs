//! Queue consumers.

mod queue_worker;

pub use queue_worker::{Disposition, QueueWorker, WorkerConfig, DEFAULT_MAX_ATTEMPTS};
