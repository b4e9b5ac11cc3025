//! Cache port - Key/value store with per-entry TTL.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::domain::foundation::DomainError;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes the given keys. Missing keys are ignored.
    async fn delete(&self, keys: &[String]) -> Result<(), DomainError>;

    /// Deletes every key starting with `prefix`. Returns how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, DomainError>;
}

/// Reads and decodes a JSON entry. Undecodable entries read as a miss.
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn Cache,
    key: &str,
) -> Result<Option<T>, DomainError> {
    match cache.get(key).await? {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize + Sync>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), DomainError> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, raw, ttl).await
}
