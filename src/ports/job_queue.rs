//! JobQueue port - Durable, acknowledgment-based named queues.
//!
//! Messages are persisted by `publish` before it returns. A received message
//! stays "in flight" until it is acked or nacked; messages still in flight
//! when a consumer dies are returned to the queue by `recover_in_flight`.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::domain::foundation::{DomainError, MessageId};
use crate::domain::jobs::{JobError, QueueMessage, QueueName};

/// A message handed to a consumer, plus what the broker needs to settle it.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub queue: QueueName,
    pub message: QueueMessage,
    /// Opaque broker handle identifying this in-flight copy.
    pub receipt: String,
    /// Set when the stored bytes were not a valid envelope. `message.data`
    /// then holds the raw text and the worker dead-letters it unhandled.
    pub decode_error: Option<String>,
}

impl Delivery {
    pub fn new(queue: QueueName, message: QueueMessage, receipt: impl Into<String>) -> Self {
        Self {
            queue,
            message,
            receipt: receipt.into(),
            decode_error: None,
        }
    }

    /// A raw broker entry that does not decode as a `QueueMessage`.
    pub fn undecodable(queue: QueueName, raw: String, error: impl Into<String>) -> Self {
        Self {
            queue,
            message: QueueMessage::new(Value::String(raw.clone())),
            receipt: raw,
            decode_error: Some(error.into()),
        }
    }
}

/// Message counts for one queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueDepth {
    pub pending: u64,
    pub in_flight: u64,
    pub dead: u64,
}

/// Port for the durable queue broker.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Persists a message at the tail of `queue`.
    async fn publish(&self, queue: QueueName, message: QueueMessage) -> Result<(), DomainError>;

    /// Takes the next message, if any, and marks it in flight. Never blocks
    /// waiting for a message. Entries that do not decode are still returned,
    /// as [`Delivery::undecodable`], so the consumer can dead-letter them.
    async fn receive(&self, queue: QueueName) -> Result<Option<Delivery>, DomainError>;

    /// Removes a successfully handled message.
    async fn ack(&self, delivery: &Delivery) -> Result<(), DomainError>;

    /// Settles a failed message. `requeue = true` puts it back with its
    /// retry count incremented; `false` moves it to the dead-letter list.
    async fn nack(&self, delivery: &Delivery, requeue: bool) -> Result<(), DomainError>;

    /// Returns in-flight messages to the queue after a crash. Returns how many
    /// were moved.
    async fn recover_in_flight(&self, queue: QueueName) -> Result<u64, DomainError>;

    async fn depth(&self, queue: QueueName) -> Result<QueueDepth, DomainError>;

    /// Most recent dead letters first.
    async fn dead_letters(
        &self,
        queue: QueueName,
        limit: usize,
    ) -> Result<Vec<QueueMessage>, DomainError>;

    async fn purge_dead_letters(&self, queue: QueueName) -> Result<u64, DomainError>;
}

/// Handles the messages of one queue.
///
/// Returning `Ok` acks the message. `Err(JobError::Transient)` goes through
/// the broker retry path; `Err(JobError::Malformed)` is dead-lettered at once.
#[async_trait]
pub trait JobHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, message: &QueueMessage) -> Result<(), JobError>;
}

/// Wraps `job` in a fresh envelope and publishes it.
pub async fn publish_job<T>(
    queue: &dyn JobQueue,
    name: QueueName,
    job: &T,
) -> Result<MessageId, DomainError>
where
    T: Serialize + Sync,
{
    let message = QueueMessage::new(serde_json::to_value(job)?);
    let id = message.id;
    queue.publish(name, message).await?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn JobQueue, _: &dyn JobHandler) {}

    #[test]
    fn depth_defaults_to_empty() {
        assert_eq!(QueueDepth::default().pending, 0);
    }
}
