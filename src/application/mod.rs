//! Application layer - workers, job handlers and producer-side services.
//!
//! Workers drive handlers off the queues; the write service and thread cache
//! sit on the producer side and feed the queues; the pipeline owns the
//! lifecycle of everything that runs in the background.

pub mod handlers;
pub mod pipeline;
pub mod retention;
pub mod thread_cache;
pub mod workers;
pub mod write_service;

pub use handlers::{
    moderation_job_for, DeliverWebhookHandler, DeliveryConfig, IngestEmailStatusHandler,
    IngestError, ModerateContentHandler, ModerationOutcome, NotificationReport,
    SendNotificationHandler, SideEffectError, SummarizeThreadHandler, TargetOutcome,
};
pub use pipeline::{build_handler, build_workers, Pipeline, PipelineDeps, PipelineSettings};
pub use retention::RetentionSweeper;
pub use thread_cache::{ThreadCache, DEFAULT_THREAD_TTL};
pub use workers::{Disposition, QueueWorker, WorkerConfig, DEFAULT_MAX_ATTEMPTS};
pub use write_service::{
    CreateThreadCommand, EditPostCommand, ForumWriteService, SubmitPostCommand,
    UpdateThreadCommand,
};
