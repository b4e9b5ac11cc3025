//! Redis cache adapter.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::domain::foundation::DomainError;
use crate::ports::Cache;

/// Keys scanned per `SCAN` round trip during prefix deletion.
const SCAN_BATCH: usize = 500;

#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

fn cache_err(e: redis::RedisError) -> DomainError {
    DomainError::cache(e.to_string())
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(cache_err)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(cache_err)
    }

    async fn delete(&self, keys: &[String]) -> Result<(), DomainError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(keys.to_vec()).await.map_err(cache_err)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, DomainError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut removed = 0u64;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(cache_err)?;
            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await.map_err(cache_err)?;
                removed += deleted;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}
