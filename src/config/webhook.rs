//! Webhook configuration (inbound verification and outbound delivery)

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret for inbound email-status signatures
    pub inbound_secret: Secret<String>,

    /// Oldest accepted inbound timestamp in seconds; 0 disables the check
    #[serde(default = "default_max_timestamp_age")]
    pub max_timestamp_age_secs: u64,

    /// Per-request timeout for outbound deliveries
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_secs: u64,

    /// Attempts per target, including the first
    #[serde(default = "default_delivery_attempts")]
    pub delivery_attempts: u32,

    /// First retry delay; doubles on every further retry
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl WebhookConfig {
    pub fn max_timestamp_age(&self) -> Duration {
        Duration::from_secs(self.max_timestamp_age_secs)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.inbound_secret.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("WEBHOOK_INBOUND_SECRET"));
        }
        if self.delivery_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !(1..=10).contains(&self.delivery_attempts) {
            return Err(ValidationError::InvalidDeliveryAttempts);
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            inbound_secret: Secret::new(String::new()),
            max_timestamp_age_secs: default_max_timestamp_age(),
            delivery_timeout_secs: default_delivery_timeout(),
            delivery_attempts: default_delivery_attempts(),
            backoff_base_ms: default_backoff_base(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_max_timestamp_age() -> u64 {
    300
}

fn default_delivery_timeout() -> u64 {
    10
}

fn default_delivery_attempts() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    1000
}

fn default_user_agent() -> String {
    "ForumPipeline-Webhook/1.0".to_string()
}
