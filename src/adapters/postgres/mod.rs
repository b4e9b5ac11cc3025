//! PostgreSQL adapters - sqlx implementations of the repository ports.
//!
//! Schema lives in `migrations/`. Enum columns are stored as their
//! lowercase string forms and parsed back through `FromStr`.

mod content;
mod notifications;
mod tickets;
mod users;
mod webhooks;

pub use content::{PostgresContentRepository, PostgresThreadRepository};
pub use notifications::PostgresNotificationRepository;
pub use tickets::PostgresReviewTicketRepository;
pub use users::PostgresUserDirectory;
pub use webhooks::{PostgresDeliveryLog, PostgresWebhookSubscriptionRepository};
