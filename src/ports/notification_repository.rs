//! NotificationRepository port - The persisted inbox.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, NotificationId, Timestamp, UserId};
use crate::domain::notification::Notification;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: &Notification) -> Result<(), DomainError>;

    /// Newest first.
    async fn find_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
        limit: u32,
    ) -> Result<Vec<Notification>, DomainError>;

    /// Returns `false` if no such notification belongs to the user.
    async fn mark_read(&self, id: &NotificationId, user_id: &UserId) -> Result<bool, DomainError>;

    /// Returns how many notifications changed.
    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, DomainError>;

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, DomainError>;

    /// Deletes notifications whose `expires_at` is at or before `now`.
    async fn delete_expired(&self, now: Timestamp) -> Result<u64, DomainError>;
}
