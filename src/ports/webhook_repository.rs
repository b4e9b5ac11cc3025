//! Webhook subscription and delivery-log persistence ports.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::webhook::{DeliveryLogFilter, WebhookDeliveryLog, WebhookSubscription};

#[async_trait]
pub trait WebhookSubscriptionRepository: Send + Sync {
    async fn insert(&self, subscription: &WebhookSubscription) -> Result<(), DomainError>;

    /// Active subscriptions listing `event`.
    async fn find_active_for_event(&self, event: &str) -> Result<Vec<WebhookSubscription>, DomainError>;
}

/// Append-only audit trail.
#[async_trait]
pub trait DeliveryLogRepository: Send + Sync {
    async fn append(&self, entry: &WebhookDeliveryLog) -> Result<(), DomainError>;

    /// Newest first, capped at the filter's limit.
    async fn query(&self, filter: &DeliveryLogFilter) -> Result<Vec<WebhookDeliveryLog>, DomainError>;
}
