//! Cache TTL configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Thread reads and listing pages
    #[serde(default = "default_thread_ttl")]
    pub thread_ttl_secs: u64,

    /// Generated thread summaries
    #[serde(default = "default_summary_ttl")]
    pub summary_ttl_secs: u64,
}

impl CacheConfig {
    pub fn thread_ttl(&self) -> Duration {
        Duration::from_secs(self.thread_ttl_secs)
    }

    pub fn summary_ttl(&self) -> Duration {
        Duration::from_secs(self.summary_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.thread_ttl_secs == 0 {
            return Err(ValidationError::ZeroTtl("thread_ttl_secs"));
        }
        if self.summary_ttl_secs == 0 {
            return Err(ValidationError::ZeroTtl("summary_ttl_secs"));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            thread_ttl_secs: default_thread_ttl(),
            summary_ttl_secs: default_summary_ttl(),
        }
    }
}

fn default_thread_ttl() -> u64 {
    300
}

fn default_summary_ttl() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.thread_ttl(), Duration::from_secs(300));
        assert_eq!(config.summary_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn zero_ttl_is_invalid() {
        let config = CacheConfig {
            summary_ttl_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
