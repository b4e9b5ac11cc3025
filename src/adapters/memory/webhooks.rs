//! In-memory webhook subscriptions and delivery log.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::domain::webhook::{DeliveryLogFilter, WebhookDeliveryLog, WebhookSubscription};
use crate::ports::{DeliveryLogRepository, WebhookSubscriptionRepository};

#[derive(Default)]
pub struct InMemoryWebhookSubscriptionRepository {
    subscriptions: RwLock<Vec<WebhookSubscription>>,
}

impl InMemoryWebhookSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookSubscriptionRepository for InMemoryWebhookSubscriptionRepository {
    async fn insert(&self, subscription: &WebhookSubscription) -> Result<(), DomainError> {
        self.subscriptions.write().await.push(subscription.clone());
        Ok(())
    }

    async fn find_active_for_event(&self, event: &str) -> Result<Vec<WebhookSubscription>, DomainError> {
        Ok(self
            .subscriptions
            .read()
            .await
            .iter()
            .filter(|s| s.matches(event))
            .cloned()
            .collect())
    }
}

/// Append-only log, newest entries last in storage and first in queries.
#[derive(Default)]
pub struct InMemoryDeliveryLog {
    entries: RwLock<Vec<WebhookDeliveryLog>>,
}

impl InMemoryDeliveryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<WebhookDeliveryLog> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl DeliveryLogRepository for InMemoryDeliveryLog {
    async fn append(&self, entry: &WebhookDeliveryLog) -> Result<(), DomainError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn query(&self, filter: &DeliveryLogFilter) -> Result<Vec<WebhookDeliveryLog>, DomainError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .take(filter.effective_limit() as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::webhook::{DeliveryStatus, LogSource};
    use serde_json::json;

    #[tokio::test]
    async fn inactive_subscriptions_are_not_matched() {
        let repo = InMemoryWebhookSubscriptionRepository::new();
        let live = WebhookSubscription::new("https://a.example/hook", vec!["notification.sent".into()]).unwrap();
        let mut off = WebhookSubscription::new("https://b.example/hook", vec!["notification.sent".into()]).unwrap();
        off.deactivate();
        repo.insert(&live).await.unwrap();
        repo.insert(&off).await.unwrap();

        let found = repo.find_active_for_event("notification.sent").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://a.example/hook");
    }

    #[tokio::test]
    async fn query_filters_and_returns_newest_first() {
        let log = InMemoryDeliveryLog::new();
        log.append(&WebhookDeliveryLog::success("email.delivered", json!({"n": 1}), LogSource::Email))
            .await
            .unwrap();
        log.append(&WebhookDeliveryLog::failure("external.x", json!({}), LogSource::External, "boom"))
            .await
            .unwrap();
        log.append(&WebhookDeliveryLog::success("email.opened", json!({"n": 2}), LogSource::Email))
            .await
            .unwrap();

        let filter = DeliveryLogFilter {
            source: Some(LogSource::Email),
            ..Default::default()
        };
        let found = log.query(&filter).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].event, "email.opened");

        let failed = DeliveryLogFilter {
            status: Some(DeliveryStatus::Failed),
            limit: Some(5),
            ..Default::default()
        };
        assert_eq!(log.query(&failed).await.unwrap().len(), 1);
    }
}
