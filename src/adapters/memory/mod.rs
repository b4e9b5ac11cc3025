//! In-memory repositories for tests and local runs without PostgreSQL.

mod content;
mod directory;
mod notifications;
mod tickets;
mod webhooks;

pub use content::{InMemoryContentRepository, InMemoryThreadRepository};
pub use directory::InMemoryUserDirectory;
pub use notifications::InMemoryNotificationRepository;
pub use tickets::InMemoryReviewTicketRepository;
pub use webhooks::{InMemoryDeliveryLog, InMemoryWebhookSubscriptionRepository};
