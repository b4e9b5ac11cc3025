//! In-memory content and thread stores.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::content::{ContentItem, LifecycleStatus, ModerationUpdate};
use crate::domain::foundation::{ContentId, DomainError, ErrorCode, ThreadId, Timestamp};
use crate::domain::thread::{Thread, ThreadListQuery, ThreadSort};
use crate::ports::{ContentRepository, ThreadRepository};

#[derive(Default)]
pub struct InMemoryContentRepository {
    items: RwLock<HashMap<ContentId, ContentItem>>,
    fail_writes: AtomicBool,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes writes fail with a database error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn get(&self, id: &ContentId) -> Option<ContentItem> {
        self.items.read().await.get(id).cloned()
    }

    fn check_write(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(DomainError::database("content store unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn insert(&self, item: &ContentItem) -> Result<(), DomainError> {
        self.check_write()?;
        self.items.write().await.insert(item.id, item.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ContentId) -> Result<Option<ContentItem>, DomainError> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn update_body(&self, item: &ContentItem) -> Result<(), DomainError> {
        self.check_write()?;
        let mut items = self.items.write().await;
        let stored = items.get_mut(&item.id).ok_or_else(|| {
            DomainError::new(ErrorCode::ContentNotFound, "content not found")
                .with_detail("content_id", item.id.to_string())
        })?;
        stored.body = item.body.clone();
        stored.moderation_status = item.moderation_status;
        stored.updated_at = item.updated_at;
        Ok(())
    }

    async fn save_moderation(&self, update: &ModerationUpdate) -> Result<bool, DomainError> {
        self.check_write()?;
        // One write lock covers every field, like the single SQL UPDATE.
        let mut items = self.items.write().await;
        match items.get_mut(&update.content_id) {
            Some(item) => {
                item.apply(update);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_deleted(&self, id: &ContentId) -> Result<(), DomainError> {
        self.check_write()?;
        if let Some(item) = self.items.write().await.get_mut(id) {
            item.mark_deleted();
        }
        Ok(())
    }

    async fn list_visible_for_thread(
        &self,
        thread_id: &ThreadId,
        limit: usize,
    ) -> Result<Vec<ContentItem>, DomainError> {
        let items = self.items.read().await;
        let mut visible: Vec<ContentItem> = items
            .values()
            .filter(|i| i.thread_id == *thread_id && i.is_visible())
            .cloned()
            .collect();
        visible.sort_by_key(|i| i.created_at);
        visible.truncate(limit);
        Ok(visible)
    }
}

#[derive(Default)]
pub struct InMemoryThreadRepository {
    threads: RwLock<HashMap<ThreadId, Thread>>,
    reads: std::sync::atomic::AtomicUsize,
}

impl InMemoryThreadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_*`/`list` calls served, for cache hit assertions.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn count_read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ThreadRepository for InMemoryThreadRepository {
    async fn insert(&self, thread: &Thread) -> Result<(), DomainError> {
        self.threads.write().await.insert(thread.id, thread.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ThreadId) -> Result<Option<Thread>, DomainError> {
        self.count_read();
        Ok(self.threads.read().await.get(id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Thread>, DomainError> {
        self.count_read();
        Ok(self
            .threads
            .read()
            .await
            .values()
            .find(|t| t.slug == slug)
            .cloned())
    }

    async fn list(&self, query: &ThreadListQuery) -> Result<Vec<Thread>, DomainError> {
        self.count_read();
        let threads = self.threads.read().await;
        let mut page: Vec<Thread> = threads
            .values()
            .filter(|t| t.is_active())
            .filter(|t| query.category.is_none() || t.category == query.category)
            .cloned()
            .collect();
        match query.sort {
            ThreadSort::Newest => page.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ThreadSort::Active => page.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
            ThreadSort::Popular => page.sort_by(|a, b| b.post_count.cmp(&a.post_count)),
        }
        Ok(page
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn update(&self, thread: &Thread) -> Result<(), DomainError> {
        let mut threads = self.threads.write().await;
        if !threads.contains_key(&thread.id) {
            return Err(DomainError::new(ErrorCode::ThreadNotFound, "thread not found"));
        }
        threads.insert(thread.id, thread.clone());
        Ok(())
    }

    async fn soft_delete(&self, id: &ThreadId) -> Result<(), DomainError> {
        if let Some(thread) = self.threads.write().await.get_mut(id) {
            thread.lifecycle = LifecycleStatus::Deleted;
            thread.updated_at = Timestamp::now();
        }
        Ok(())
    }

    async fn adjust_post_count(&self, id: &ThreadId, delta: i64) -> Result<(), DomainError> {
        if let Some(thread) = self.threads.write().await.get_mut(id) {
            thread.post_count = (thread.post_count + delta).max(0);
            thread.updated_at = Timestamp::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::{ModerationVerdict, Recommendation, ScoreSnapshot};
    use crate::domain::foundation::UserId;

    #[tokio::test]
    async fn save_moderation_reports_missing_content() {
        let repo = InMemoryContentRepository::new();
        let verdict = ModerationVerdict::new(
            ScoreSnapshot::new(0.0, 0.0, 0.0).unwrap(),
            Recommendation::Approve,
            "ok",
        );
        let update = ModerationUpdate::from_verdict(ContentId::new(), &verdict);
        assert!(!repo.save_moderation(&update).await.unwrap());
    }

    #[tokio::test]
    async fn visible_posts_are_oldest_first_and_capped() {
        let repo = InMemoryContentRepository::new();
        let thread_id = ThreadId::new();
        for i in 0..3 {
            let item = ContentItem::submit(thread_id, UserId::new(), None, format!("post {}", i)).unwrap();
            repo.insert(&item).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        let mut hidden = ContentItem::submit(thread_id, UserId::new(), None, "gone").unwrap();
        hidden.mark_deleted();
        repo.insert(&hidden).await.unwrap();

        let posts = repo.list_visible_for_thread(&thread_id, 2).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].body, "post 0");
        assert_eq!(posts[1].body, "post 1");
    }

    #[tokio::test]
    async fn thread_list_skips_deleted() {
        let repo = InMemoryThreadRepository::new();
        let keep = Thread::new(UserId::new(), "Keep", None).unwrap();
        let drop = Thread::new(UserId::new(), "Drop", None).unwrap();
        repo.insert(&keep).await.unwrap();
        repo.insert(&drop).await.unwrap();
        repo.soft_delete(&drop.id).await.unwrap();

        let page = repo.list(&ThreadListQuery::default()).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, keep.id);
    }
}
