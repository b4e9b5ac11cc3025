//! ThreadRepository port - Persistence for threads.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ThreadId};
use crate::domain::thread::{Thread, ThreadListQuery};

#[async_trait]
pub trait ThreadRepository: Send + Sync {
    async fn insert(&self, thread: &Thread) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &ThreadId) -> Result<Option<Thread>, DomainError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Thread>, DomainError>;

    /// Active threads only.
    async fn list(&self, query: &ThreadListQuery) -> Result<Vec<Thread>, DomainError>;

    async fn update(&self, thread: &Thread) -> Result<(), DomainError>;

    async fn soft_delete(&self, id: &ThreadId) -> Result<(), DomainError>;

    async fn adjust_post_count(&self, id: &ThreadId, delta: i64) -> Result<(), DomainError>;
}
