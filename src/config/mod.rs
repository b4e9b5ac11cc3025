//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `FORUM_PIPELINE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use forum_pipeline::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod cache;
mod database;
mod error;
mod queue;
mod redis;
mod retention;
mod server;
mod webhook;

pub use ai::AiConfig;
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use queue::QueueConfig;
pub use redis::RedisConfig;
pub use retention::RetentionConfig;
pub use server::{Environment, ServerConfig};
pub use webhook::WebhookConfig;

use serde::Deserialize;

use crate::application::{DeliveryConfig, PipelineSettings};

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Redis configuration (queues, cache, pub/sub)
    pub redis: RedisConfig,

    /// Worker concurrency and retry policy
    #[serde(default)]
    pub queue: QueueConfig,

    /// Inbound verification and outbound delivery
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Scoring model (optional)
    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub retention: RetentionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `FORUM_PIPELINE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `FORUM_PIPELINE__SERVER__LISTEN_ADDR=0.0.0.0:8080` -> `server.listen_addr`
    /// - `FORUM_PIPELINE__WEBHOOK__INBOUND_SECRET=...` -> `webhook.inbound_secret = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("FORUM_PIPELINE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.queue.validate()?;
        self.webhook.validate()?;
        self.cache.validate()?;
        self.ai.validate()?;
        self.retention.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Worker and handler settings for [`Pipeline::start`](crate::application::Pipeline::start).
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            moderation_concurrency: self.queue.moderation_concurrency,
            summary_concurrency: self.queue.summary_concurrency,
            notification_concurrency: self.queue.notification_concurrency,
            webhook_concurrency: self.queue.webhook_concurrency,
            max_attempts: self.queue.max_attempts,
            poll_interval: self.queue.poll_interval(),
            shutdown_grace: self.queue.shutdown_grace(),
            delivery: DeliveryConfig {
                timeout: self.webhook.delivery_timeout(),
                attempts: self.webhook.delivery_attempts,
                backoff_base: self.webhook.backoff_base(),
                user_agent: self.webhook.user_agent.clone(),
            },
            summary_ttl: self.cache.summary_ttl(),
            notification_retention_days: self.retention.notification_days,
            retention_interval: self.retention.sweep_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use std::time::Duration;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to set environment variables for testing
    fn set_minimal_env() {
        env::set_var("FORUM_PIPELINE__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("FORUM_PIPELINE__REDIS__URL", "redis://localhost:6379");
        env::set_var("FORUM_PIPELINE__WEBHOOK__INBOUND_SECRET", "whsec_test");
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for key in [
            "FORUM_PIPELINE__DATABASE__URL",
            "FORUM_PIPELINE__REDIS__URL",
            "FORUM_PIPELINE__WEBHOOK__INBOUND_SECRET",
            "FORUM_PIPELINE__SERVER__LISTEN_ADDR",
            "FORUM_PIPELINE__SERVER__ENVIRONMENT",
            "FORUM_PIPELINE__QUEUE__WEBHOOK_CONCURRENCY",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.redis.url, "redis://localhost:6379");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_flow_into_pipeline_settings() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let settings = result.unwrap().pipeline_settings();
        assert_eq!(settings.moderation_concurrency, 5);
        assert_eq!(settings.summary_concurrency, 2);
        assert_eq!(settings.notification_concurrency, 10);
        assert_eq!(settings.webhook_concurrency, 5);
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.delivery.timeout, Duration::from_secs(10));
        assert_eq!(settings.summary_ttl, Duration::from_secs(3600));
        assert_eq!(settings.retention_interval, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_nested_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("FORUM_PIPELINE__QUEUE__WEBHOOK_CONCURRENCY", "8");
        env::set_var("FORUM_PIPELINE__SERVER__LISTEN_ADDR", "3000");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.queue.webhook_concurrency, 8);
        assert_eq!(config.server.socket_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_missing_secret_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::remove_var("FORUM_PIPELINE__WEBHOOK__INBOUND_SECRET");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("FORUM_PIPELINE__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }
}
