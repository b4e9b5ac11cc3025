//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the pipeline and the outside world. Adapters implement these ports.
//!
//! ## Messaging Ports
//!
//! - `JobQueue` - Durable named queues with ack/nack
//! - `JobHandler` - Per-queue message handler driven by a worker
//! - `RealtimePublisher` - Topic fan-out to connected clients
//! - `WebhookClient` - Outbound HTTP deliveries
//!
//! ## Storage Ports
//!
//! - `Cache` - TTL key/value store
//! - `ContentRepository`, `ThreadRepository`, `UserDirectory`
//! - `ReviewTicketRepository`, `NotificationRepository`
//! - `WebhookSubscriptionRepository`, `DeliveryLogRepository`
//!
//! ## Scoring
//!
//! - `ContentScorer` - moderation scores and thread summaries

mod cache;
mod content_repository;
mod content_scorer;
mod job_queue;
mod notification_repository;
mod realtime;
mod review_ticket_repository;
mod thread_repository;
mod user_directory;
mod webhook_client;
mod webhook_repository;

pub use cache::{get_json, set_json, Cache};
pub use content_repository::ContentRepository;
pub use content_scorer::{ContentScorer, SummaryInput, SummaryOutput, SummaryPost};
pub use job_queue::{publish_job, Delivery, JobHandler, JobQueue, QueueDepth};
pub use notification_repository::NotificationRepository;
pub use realtime::{
    RealtimeEvent, RealtimePublisher, Topic, NOTIFICATION_ALL_READ, NOTIFICATION_NEW,
    POST_CREATED, THREAD_CREATED, THREAD_DELETED, THREAD_UPDATED,
};
pub use review_ticket_repository::ReviewTicketRepository;
pub use thread_repository::ThreadRepository;
pub use user_directory::UserDirectory;
pub use webhook_client::{DeliveryError, OutboundRequest, WebhookClient};
pub use webhook_repository::{DeliveryLogRepository, WebhookSubscriptionRepository};
