//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid listen address")]
    InvalidListenAddress,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Queue key prefix must be a single non-empty segment")]
    InvalidQueuePrefix,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Queue concurrency must be at least 1: {0}")]
    ZeroConcurrency(&'static str),

    #[error("Queue max_attempts must be at least 1")]
    ZeroMaxAttempts,

    #[error("Webhook delivery attempts must be between 1 and 10")]
    InvalidDeliveryAttempts,

    #[error("Cache TTL must be non-zero: {0}")]
    ZeroTtl(&'static str),

    #[error("Invalid AI base URL")]
    InvalidAiBaseUrl,

    #[error("Retention window must be at least one day")]
    InvalidRetention,
}
