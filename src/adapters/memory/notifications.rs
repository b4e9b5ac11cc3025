//! In-memory notification store.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, NotificationId, Timestamp, UserId};
use crate::domain::notification::Notification;
use crate::ports::NotificationRepository;

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    rows: RwLock<Vec<Notification>>,
    fail_inserts: AtomicBool,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<(), DomainError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(DomainError::database("notification store unavailable"));
        }
        self.rows.write().await.push(notification.clone());
        Ok(())
    }

    async fn find_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
        limit: u32,
    ) -> Result<Vec<Notification>, DomainError> {
        let rows = self.rows.read().await;
        let mut found: Vec<Notification> = rows
            .iter()
            .filter(|n| n.user_id == *user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn mark_read(&self, id: &NotificationId, user_id: &UserId) -> Result<bool, DomainError> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|n| n.id == *id && n.user_id == *user_id) {
            Some(n) => {
                n.mark_read();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let mut changed = 0;
        for n in self
            .rows
            .write()
            .await
            .iter_mut()
            .filter(|n| n.user_id == *user_id && !n.is_read)
        {
            n.mark_read();
            changed += 1;
        }
        Ok(changed)
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, DomainError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == *user_id && !n.is_read)
            .count() as u64)
    }

    async fn delete_expired(&self, now: Timestamp) -> Result<u64, DomainError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|n| !n.is_expired_at(&now));
        Ok((before - rows.len()) as u64)
    }
}
