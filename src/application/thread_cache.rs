//! ThreadCache - read-through cache for hot thread reads.
//!
//! Reads go cache first, fall through to the repository on a miss and
//! repopulate with a fixed TTL. A cache outage degrades to direct repository
//! reads. Writers call the `invalidate_*` methods synchronously after the
//! store write; invalidation failures are logged and left to the TTL.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::foundation::{DomainError, ThreadId};
use crate::domain::thread::{cache_keys, Thread, ThreadListQuery, ThreadSummary};
use crate::ports::{get_json, set_json, Cache, ThreadRepository};

pub const DEFAULT_THREAD_TTL: Duration = Duration::from_secs(300);

pub struct ThreadCache {
    cache: Arc<dyn Cache>,
    threads: Arc<dyn ThreadRepository>,
    ttl: Duration,
}

impl ThreadCache {
    pub fn new(cache: Arc<dyn Cache>, threads: Arc<dyn ThreadRepository>) -> Self {
        Self {
            cache,
            threads,
            ttl: DEFAULT_THREAD_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn get_by_id(&self, id: &ThreadId) -> Result<Option<Thread>, DomainError> {
        let key = cache_keys::thread(id);
        if let Some(hit) = self.lookup::<Thread>(&key).await {
            return Ok(Some(hit));
        }
        let thread = self.threads.find_by_id(id).await?.filter(Thread::is_active);
        if let Some(thread) = &thread {
            self.store(&key, thread).await;
        }
        Ok(thread)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Thread>, DomainError> {
        let key = cache_keys::thread_slug(slug);
        if let Some(hit) = self.lookup::<Thread>(&key).await {
            return Ok(Some(hit));
        }
        let thread = self.threads.find_by_slug(slug).await?.filter(Thread::is_active);
        if let Some(thread) = &thread {
            self.store(&key, thread).await;
        }
        Ok(thread)
    }

    pub async fn list(&self, query: &ThreadListQuery) -> Result<Vec<Thread>, DomainError> {
        let key = cache_keys::thread_list(query);
        if let Some(hit) = self.lookup::<Vec<Thread>>(&key).await {
            return Ok(hit);
        }
        let threads = self.threads.list(query).await?;
        self.store(&key, &threads).await;
        Ok(threads)
    }

    /// Cached summary, if one has been generated and not yet expired.
    /// Summaries are never computed on the read path.
    pub async fn summary(&self, id: &ThreadId) -> Option<ThreadSummary> {
        self.lookup(&cache_keys::thread_summary(id)).await
    }

    /// Drops the entries for one thread plus every listing page.
    pub async fn invalidate_thread(&self, thread: &Thread) {
        let keys = vec![
            cache_keys::thread(&thread.id),
            cache_keys::thread_slug(&thread.slug),
        ];
        if let Err(e) = self.cache.delete(&keys).await {
            warn!(thread_id = %thread.id, error = %e, "Thread cache invalidation failed");
        }
        self.invalidate_lists().await;
    }

    pub async fn invalidate_lists(&self) {
        match self.cache.delete_prefix(cache_keys::THREAD_LIST_PREFIX).await {
            Ok(removed) => debug!(removed, "Thread list cache cleared"),
            Err(e) => warn!(error = %e, "Thread list cache invalidation failed"),
        }
    }

    async fn lookup<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match get_json(self.cache.as_ref(), key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, falling through to store");
                None
            }
        }
    }

    async fn store<T: serde::Serialize + Sync>(&self, key: &str, value: &T) {
        if let Err(e) = set_json(self.cache.as_ref(), key, value, self.ttl).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemoryCache;
    use crate::adapters::memory::InMemoryThreadRepository;
    use crate::domain::foundation::UserId;

    struct Fixture {
        cache: Arc<InMemoryCache>,
        threads: Arc<InMemoryThreadRepository>,
        reads: ThreadCache,
    }

    fn fixture() -> Fixture {
        let cache = Arc::new(InMemoryCache::new());
        let threads = Arc::new(InMemoryThreadRepository::new());
        let reads = ThreadCache::new(cache.clone(), threads.clone());
        Fixture {
            cache,
            threads,
            reads,
        }
    }

    async fn seeded(fx: &Fixture, title: &str) -> Thread {
        let thread = Thread::new(UserId::new(), title, None).unwrap();
        fx.threads.insert(&thread).await.unwrap();
        thread
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let fx = fixture();
        let thread = seeded(&fx, "Cached").await;

        let first = fx.reads.get_by_id(&thread.id).await.unwrap();
        let second = fx.reads.get_by_id(&thread.id).await.unwrap();

        assert_eq!(first, Some(thread.clone()));
        assert_eq!(second, first);
        assert_eq!(fx.threads.read_count(), 1);
        let ttl = fx.cache.ttl(&cache_keys::thread(&thread.id)).await.unwrap();
        assert!(ttl <= DEFAULT_THREAD_TTL && ttl > Duration::from_secs(290));
    }

    #[tokio::test]
    async fn invalidation_forces_fresh_read() {
        let fx = fixture();
        let mut thread = seeded(&fx, "Before").await;
        fx.reads.get_by_id(&thread.id).await.unwrap();

        thread.rename("After").unwrap();
        fx.threads.update(&thread).await.unwrap();
        fx.reads.invalidate_thread(&thread).await;

        let fresh = fx.reads.get_by_id(&thread.id).await.unwrap().unwrap();
        assert_eq!(fresh.title, "After");
        assert_eq!(fx.threads.read_count(), 2);
    }

    #[tokio::test]
    async fn missing_thread_is_not_cached() {
        let fx = fixture();
        let id = ThreadId::new();
        assert!(fx.reads.get_by_id(&id).await.unwrap().is_none());
        assert!(!fx.cache.contains(&cache_keys::thread(&id)).await);
    }

    #[tokio::test]
    async fn list_pages_are_cached_and_cleared_together() {
        let fx = fixture();
        seeded(&fx, "One").await;
        let query = ThreadListQuery::default();
        let page_two = ThreadListQuery { page: 2, ..Default::default() };

        assert_eq!(fx.reads.list(&query).await.unwrap().len(), 1);
        fx.reads.list(&page_two).await.unwrap();
        assert!(fx.cache.contains(&cache_keys::thread_list(&query)).await);

        fx.reads.invalidate_lists().await;

        assert!(!fx.cache.contains(&cache_keys::thread_list(&query)).await);
        assert!(!fx.cache.contains(&cache_keys::thread_list(&page_two)).await);
    }

    #[tokio::test]
    async fn cache_outage_falls_through_to_store() {
        let fx = fixture();
        let thread = seeded(&fx, "Resilient").await;
        fx.cache.set_unavailable(true);

        let found = fx.reads.get_by_slug(&thread.slug).await.unwrap();
        assert_eq!(found.map(|t| t.id), Some(thread.id));
    }
}
