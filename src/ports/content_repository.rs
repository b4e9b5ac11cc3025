//! ContentRepository port - Persistence for posts.

use async_trait::async_trait;

use crate::domain::content::{ContentItem, ModerationUpdate};
use crate::domain::foundation::{ContentId, DomainError, ThreadId};

#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn insert(&self, item: &ContentItem) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &ContentId) -> Result<Option<ContentItem>, DomainError>;

    /// Persists an edit: body, moderation status reset, `updated_at`.
    async fn update_body(&self, item: &ContentItem) -> Result<(), DomainError>;

    /// Writes every field of a moderation decision in a single update.
    ///
    /// Returns `false` when the content no longer exists.
    async fn save_moderation(&self, update: &ModerationUpdate) -> Result<bool, DomainError>;

    async fn mark_deleted(&self, id: &ContentId) -> Result<(), DomainError>;

    /// Up to `limit` visible posts of a thread, oldest first.
    async fn list_visible_for_thread(
        &self,
        thread_id: &ThreadId,
        limit: usize,
    ) -> Result<Vec<ContentItem>, DomainError>;
}
