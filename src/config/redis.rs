//! Redis connection settings
//!
//! One Redis instance backs the job queues, the read cache and real-time
//! pub/sub.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,

    /// Namespace for queue keys: `<prefix>:<queue>`, `:processing`, `:dead`
    #[serde(default = "default_queue_prefix")]
    pub queue_prefix: String,

    /// Seconds to wait for the initial connection
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl RedisConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("REDIS_URL"));
        }
        let scheme_ok = ["redis://", "rediss://", "unix://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme));
        if !scheme_ok {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.queue_prefix.is_empty()
            || self.queue_prefix.contains(':')
            || self.queue_prefix.contains(char::is_whitespace)
        {
            return Err(ValidationError::InvalidQueuePrefix);
        }
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            queue_prefix: default_queue_prefix(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_queue_prefix() -> String {
    "queue".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_url(url: &str) -> RedisConfig {
        RedisConfig {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_plain_tls_and_socket_urls() {
        for url in ["redis://localhost:6379", "rediss://cache.internal:6380", "unix:///tmp/redis.sock"] {
            assert!(with_url(url).validate().is_ok(), "{url} should be accepted");
        }
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(
            with_url("http://localhost:6379").validate(),
            Err(ValidationError::InvalidRedisUrl)
        );
        assert_eq!(
            RedisConfig::default().validate(),
            Err(ValidationError::MissingRequired("REDIS_URL"))
        );
    }

    #[test]
    fn queue_prefix_must_be_a_single_segment() {
        let config = RedisConfig {
            queue_prefix: "forum:queue".to_string(),
            ..with_url("redis://localhost")
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidQueuePrefix));
    }
}
