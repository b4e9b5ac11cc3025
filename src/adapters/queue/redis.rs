//! Redis-backed durable job queue.
//!
//! Reliable-queue layout per queue name:
//!
//! - `queue:<name>` - pending messages; `LPUSH` on publish, consumed from the tail
//! - `queue:<name>:processing` - in-flight copies, moved atomically by `RPOPLPUSH`
//! - `queue:<name>:dead` - dead letters, newest at the head
//!
//! A consumer that dies mid-job leaves its copy in the processing list;
//! `recover_in_flight` moves those back to pending on the next startup.
//! Requires Redis persistence (AOF or RDB) for messages to survive a broker
//! restart.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::DomainError;
use crate::domain::jobs::{QueueMessage, QueueName};
use crate::ports::{Delivery, JobQueue, QueueDepth};

#[derive(Clone)]
pub struct RedisJobQueue {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisJobQueue {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            key_prefix: "queue".to_string(),
        }
    }

    /// Overrides the `queue` key prefix, e.g. to isolate environments.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn pending_key(&self, queue: QueueName) -> String {
        format!("{}:{}", self.key_prefix, queue)
    }

    fn processing_key(&self, queue: QueueName) -> String {
        format!("{}:{}:processing", self.key_prefix, queue)
    }

    fn dead_key(&self, queue: QueueName) -> String {
        format!("{}:{}:dead", self.key_prefix, queue)
    }
}

fn queue_err(e: redis::RedisError) -> DomainError {
    DomainError::queue(e.to_string())
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn publish(&self, queue: QueueName, message: QueueMessage) -> Result<(), DomainError> {
        let raw = serde_json::to_string(&message)?;
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(self.pending_key(queue), raw)
            .await
            .map_err(queue_err)
    }

    async fn receive(&self, queue: QueueName) -> Result<Option<Delivery>, DomainError> {
        let mut conn = self.conn.clone();
        let processing = self.processing_key(queue);
        let raw: Option<String> = conn
            .rpoplpush(self.pending_key(queue), &processing)
            .await
            .map_err(queue_err)?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        Ok(Some(match serde_json::from_str::<QueueMessage>(&raw) {
            Ok(message) => Delivery::new(queue, message, raw),
            Err(e) => Delivery::undecodable(queue, raw, e.to_string()),
        }))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        conn.lrem::<_, _, ()>(self.processing_key(delivery.queue), 1, &delivery.receipt)
            .await
            .map_err(queue_err)
    }

    async fn nack(&self, delivery: &Delivery, requeue: bool) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        let processing = self.processing_key(delivery.queue);

        let (target, raw) = if requeue {
            let mut retried = delivery.message.clone();
            retried.retry_count += 1;
            (self.pending_key(delivery.queue), serde_json::to_string(&retried)?)
        } else {
            (self.dead_key(delivery.queue), delivery.receipt.clone())
        };

        redis::pipe()
            .atomic()
            .lrem(&processing, 1, &delivery.receipt)
            .ignore()
            .lpush(target, raw)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(queue_err)
    }

    async fn recover_in_flight(&self, queue: QueueName) -> Result<u64, DomainError> {
        let mut conn = self.conn.clone();
        let processing = self.processing_key(queue);
        let pending = self.pending_key(queue);
        let mut moved = 0u64;
        loop {
            let raw: Option<String> = conn
                .rpoplpush(&processing, &pending)
                .await
                .map_err(queue_err)?;
            if raw.is_none() {
                break;
            }
            moved += 1;
        }
        Ok(moved)
    }

    async fn depth(&self, queue: QueueName) -> Result<QueueDepth, DomainError> {
        let mut conn = self.conn.clone();
        let (pending, in_flight, dead): (u64, u64, u64) = redis::pipe()
            .llen(self.pending_key(queue))
            .llen(self.processing_key(queue))
            .llen(self.dead_key(queue))
            .query_async(&mut conn)
            .await
            .map_err(queue_err)?;
        Ok(QueueDepth {
            pending,
            in_flight,
            dead,
        })
    }

    async fn dead_letters(
        &self,
        queue: QueueName,
        limit: usize,
    ) -> Result<Vec<QueueMessage>, DomainError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn
            .lrange(self.dead_key(queue), 0, limit as isize - 1)
            .await
            .map_err(queue_err)?;
        // Undecodable dead letters stay in Redis for manual inspection.
        Ok(raw
            .iter()
            .filter_map(|r| serde_json::from_str(r).ok())
            .collect())
    }

    async fn purge_dead_letters(&self, queue: QueueName) -> Result<u64, DomainError> {
        let mut conn = self.conn.clone();
        let key = self.dead_key(queue);
        let (count, _): (u64, u64) = redis::pipe()
            .atomic()
            .llen(&key)
            .del(&key)
            .query_async(&mut conn)
            .await
            .map_err(queue_err)?;
        Ok(count)
    }
}

impl std::fmt::Debug for RedisJobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisJobQueue")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}
