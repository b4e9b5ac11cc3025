//! Queue vocabulary: queue names, the message envelope, per-queue payloads
//! and job failure classification.

mod errors;
mod message;
mod payloads;
mod queue;

pub use errors::JobError;
pub use message::QueueMessage;
pub use payloads::{ModerationJob, NotificationJob, SummaryJob, WebhookJob};
pub use queue::QueueName;
