//! In-memory job queue for tests and single-process runs.
//!
//! Keeps the same pending / in-flight / dead-letter bookkeeping as the Redis
//! broker so worker behavior can be asserted deterministically.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

use crate::domain::foundation::DomainError;
use crate::domain::jobs::{QueueMessage, QueueName};
use crate::ports::{Delivery, JobQueue, QueueDepth};

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueueMessage>,
    in_flight: HashMap<String, QueueMessage>,
    /// Raw entries that failed to decode, delivered ahead of `pending`.
    undecodable: VecDeque<(String, String)>,
    /// Decode errors keyed by the `in_flight` receipts that came from `undecodable`.
    undecodable_in_flight: HashMap<String, String>,
    /// Newest at the front.
    dead: VecDeque<QueueMessage>,
}

/// In-memory broker.
///
/// Every publish is also recorded in a log that survives consumption, for
/// assertions on what producers and handlers enqueued.
#[derive(Default)]
pub struct InMemoryJobQueue {
    queues: Mutex<HashMap<QueueName, QueueState>>,
    published: Mutex<Vec<(QueueName, QueueMessage)>>,
    receipts: AtomicU64,
    fail_publish: AtomicBool,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Makes every subsequent `publish` fail, simulating a broker outage.
    pub fn set_fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Everything ever published to `queue`, in publish order.
    pub async fn published(&self, queue: QueueName) -> Vec<QueueMessage> {
        self.published
            .lock()
            .await
            .iter()
            .filter(|(q, _)| *q == queue)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Published payloads of `queue` decoded as `T`. Undecodable ones are skipped.
    pub async fn published_jobs<T: DeserializeOwned>(&self, queue: QueueName) -> Vec<T> {
        self.published(queue)
            .await
            .into_iter()
            .filter_map(|m| serde_json::from_value(m.data).ok())
            .collect()
    }

    /// Stores a raw entry as the Redis broker would. Text that is not a valid
    /// `QueueMessage` envelope is delivered as [`Delivery::undecodable`].
    pub async fn push_raw(&self, queue: QueueName, raw: impl Into<String>) {
        let raw = raw.into();
        let mut queues = self.queues.lock().await;
        let state = queues.entry(queue).or_default();
        match serde_json::from_str::<QueueMessage>(&raw) {
            Ok(message) => state.pending.push_back(message),
            Err(e) => state.undecodable.push_back((raw, e.to_string())),
        }
    }

    pub async fn pending_count(&self, queue: QueueName) -> usize {
        self.queues
            .lock()
            .await
            .get(&queue)
            .map_or(0, |s| s.pending.len())
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn publish(&self, queue: QueueName, message: QueueMessage) -> Result<(), DomainError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(DomainError::queue("broker unavailable"));
        }
        self.published.lock().await.push((queue, message.clone()));
        self.queues
            .lock()
            .await
            .entry(queue)
            .or_default()
            .pending
            .push_back(message);
        Ok(())
    }

    async fn receive(&self, queue: QueueName) -> Result<Option<Delivery>, DomainError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(queue).or_default();
        if let Some((raw, error)) = state.undecodable.pop_front() {
            let delivery = Delivery::undecodable(queue, raw, error);
            state
                .undecodable_in_flight
                .insert(delivery.receipt.clone(), delivery.decode_error.clone().unwrap_or_default());
            state
                .in_flight
                .insert(delivery.receipt.clone(), delivery.message.clone());
            return Ok(Some(delivery));
        }
        let Some(message) = state.pending.pop_front() else {
            return Ok(None);
        };
        let receipt = format!(
            "{}:{}",
            message.id,
            self.receipts.fetch_add(1, Ordering::SeqCst)
        );
        state.in_flight.insert(receipt.clone(), message.clone());
        Ok(Some(Delivery::new(queue, message, receipt)))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), DomainError> {
        let mut queues = self.queues.lock().await;
        if let Some(state) = queues.get_mut(&delivery.queue) {
            state.in_flight.remove(&delivery.receipt);
            state.undecodable_in_flight.remove(&delivery.receipt);
        }
        Ok(())
    }

    async fn nack(&self, delivery: &Delivery, requeue: bool) -> Result<(), DomainError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(delivery.queue).or_default();
        let Some(mut message) = state.in_flight.remove(&delivery.receipt) else {
            return Ok(());
        };
        let undecodable = state.undecodable_in_flight.remove(&delivery.receipt);
        if let (Some(error), true) = (undecodable, requeue) {
            state.undecodable.push_back((delivery.receipt.clone(), error));
        } else if requeue {
            message.retry_count += 1;
            state.pending.push_back(message);
        } else {
            state.dead.push_front(message);
        }
        Ok(())
    }

    async fn recover_in_flight(&self, queue: QueueName) -> Result<u64, DomainError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(queue).or_default();
        let recovered: Vec<(String, QueueMessage)> = state.in_flight.drain().collect();
        let count = recovered.len() as u64;
        for (receipt, message) in recovered {
            if let Some(error) = state.undecodable_in_flight.remove(&receipt) {
                state.undecodable.push_front((receipt, error));
            } else {
                state.pending.push_front(message);
            }
        }
        Ok(count)
    }

    async fn depth(&self, queue: QueueName) -> Result<QueueDepth, DomainError> {
        let queues = self.queues.lock().await;
        Ok(queues.get(&queue).map_or_else(QueueDepth::default, |s| QueueDepth {
            pending: (s.pending.len() + s.undecodable.len()) as u64,
            in_flight: s.in_flight.len() as u64,
            dead: s.dead.len() as u64,
        }))
    }

    async fn dead_letters(
        &self,
        queue: QueueName,
        limit: usize,
    ) -> Result<Vec<QueueMessage>, DomainError> {
        let queues = self.queues.lock().await;
        Ok(queues
            .get(&queue)
            .map(|s| s.dead.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn purge_dead_letters(&self, queue: QueueName) -> Result<u64, DomainError> {
        let mut queues = self.queues.lock().await;
        let state = queues.entry(queue).or_default();
        let count = state.dead.len() as u64;
        state.dead.clear();
        Ok(count)
    }
}
