//! Queue worker configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Per-queue concurrency and the shared retry/shutdown policy.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_moderation_concurrency")]
    pub moderation_concurrency: usize,

    #[serde(default = "default_summary_concurrency")]
    pub summary_concurrency: usize,

    #[serde(default = "default_notification_concurrency")]
    pub notification_concurrency: usize,

    #[serde(default = "default_webhook_concurrency")]
    pub webhook_concurrency: usize,

    /// Attempts per message before dead-lettering
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Idle wait between polls of an empty queue
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// How long shutdown waits for in-flight messages
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

impl QueueConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let concurrencies = [
            ("moderation_concurrency", self.moderation_concurrency),
            ("summary_concurrency", self.summary_concurrency),
            ("notification_concurrency", self.notification_concurrency),
            ("webhook_concurrency", self.webhook_concurrency),
        ];
        if let Some((name, _)) = concurrencies.iter().find(|(_, n)| *n == 0) {
            return Err(ValidationError::ZeroConcurrency(name));
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::ZeroMaxAttempts);
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            moderation_concurrency: default_moderation_concurrency(),
            summary_concurrency: default_summary_concurrency(),
            notification_concurrency: default_notification_concurrency(),
            webhook_concurrency: default_webhook_concurrency(),
            max_attempts: default_max_attempts(),
            poll_interval_ms: default_poll_interval(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

fn default_moderation_concurrency() -> usize {
    5
}

fn default_summary_concurrency() -> usize {
    2
}

fn default_notification_concurrency() -> usize {
    10
}

fn default_webhook_concurrency() -> usize {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_poll_interval() -> u64 {
    250
}

fn default_shutdown_grace() -> u64 {
    30
}
