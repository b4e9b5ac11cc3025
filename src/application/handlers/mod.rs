//! Queue job handlers.
//!
//! One handler per queue. Each implements [`JobHandler`](crate::ports::JobHandler)
//! and is driven by a [`QueueWorker`](crate::application::workers::QueueWorker).
//! The inbound email-status handler sits here too since it feeds the
//! webhook queue.

mod deliver_webhook;
mod ingest_email_status;
mod moderate_content;
mod send_notification;
mod side_effects;
mod summarize_thread;

pub use deliver_webhook::{DeliverWebhookHandler, DeliveryConfig, TargetOutcome, DEFAULT_USER_AGENT};
pub use ingest_email_status::{IngestEmailStatusHandler, IngestError};
pub use moderate_content::{moderation_job_for, ModerateContentHandler, ModerationOutcome};
pub use send_notification::{NotificationReport, SendNotificationHandler};
pub use side_effects::SideEffectError;
pub use summarize_thread::{SummarizeThreadHandler, DEFAULT_SUMMARY_TTL, SUMMARY_POST_LIMIT};
