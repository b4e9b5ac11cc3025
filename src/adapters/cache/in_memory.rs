//! In-memory TTL cache for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::Cache;

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    unavailable: AtomicBool,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Makes every operation fail, simulating an unreachable cache.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .await
            .get(key)
            .map_or(false, |e| e.expires_at > Instant::now())
    }

    /// Remaining lifetime of a live key.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        self.entries
            .read()
            .await
            .get(key)
            .and_then(|e| e.expires_at.checked_duration_since(Instant::now()))
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(DomainError::cache("cache unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        self.check()?;
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), DomainError> {
        self.check()?;
        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), DomainError> {
        self.check()?;
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, DomainError> {
        self.check()?;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let cache = InMemoryCache::new();
        cache.set("thread:1", "v".into(), Duration::from_secs(300)).await.unwrap();
        assert_eq!(cache.get("thread:1").await.unwrap().as_deref(), Some("v"));
        assert!(cache.ttl("thread:1").await.unwrap() <= Duration::from_secs(300));
    }

    #[tokio::test]
    async fn expired_entries_read_as_miss() {
        let cache = InMemoryCache::new();
        cache.set("k", "v".into(), Duration::from_millis(0)).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_prefix_only_removes_matching_keys() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("threads:list:a", "1".into(), ttl).await.unwrap();
        cache.set("threads:list:b", "2".into(), ttl).await.unwrap();
        cache.set("thread:x", "3".into(), ttl).await.unwrap();

        assert_eq!(cache.delete_prefix("threads:list:").await.unwrap(), 2);
        assert!(cache.contains("thread:x").await);
    }

    #[tokio::test]
    async fn unavailable_cache_errors() {
        let cache = InMemoryCache::new();
        cache.set_unavailable(true);
        assert!(cache.get("k").await.is_err());
    }
}
