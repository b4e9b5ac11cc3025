//! QueueWorker - consumer loop for one named queue.
//!
//! Pulls messages with a bounded number in flight, hands each to the
//! queue's `JobHandler` and settles it with the broker:
//!
//! | Handler result | Attempt < max | Attempt = max |
//! |----------------|---------------|---------------|
//! | `Ok` | ack | ack |
//! | `Transient` / panic | nack, requeue | nack, dead-letter + audit |
//! | `Malformed` | nack, dead-letter + audit | same |
//!
//! Deliveries whose stored bytes did not decode skip the handler and are
//! dead-lettered with an audit record like `Malformed`.
//!
//! ## Graceful Shutdown
//!
//! On the shutdown signal the worker stops receiving, waits up to
//! `shutdown_grace` for in-flight handlers, then returns. Handlers still
//! running after the grace period are abandoned; their messages stay in the
//! broker's in-flight list and are recovered on the next start.

use futures::FutureExt;
use serde_json::json;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::domain::foundation::DomainError;
use crate::domain::jobs::{JobError, QueueName};
use crate::domain::webhook::{LogSource, WebhookDeliveryLog};
use crate::ports::{DeliveryLogRepository, Delivery, JobHandler, JobQueue};

/// Default attempt ceiling per message (1 original + 2 retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Messages handled at the same time.
    pub concurrency: usize,
    pub max_attempts: u32,
    /// Wait between polls when the queue is empty.
    pub poll_interval: Duration,
    pub shutdown_grace: Duration,
}

impl WorkerConfig {
    pub fn for_queue(queue: QueueName) -> Self {
        Self {
            concurrency: queue.default_concurrency(),
            ..Self::default()
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: Duration::from_millis(250),
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

/// What happened to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Queue was empty.
    Idle,
    Acked,
    Requeued { attempt: u32 },
    DeadLettered { attempt: u32 },
}

pub struct QueueWorker {
    queue_name: QueueName,
    queue: Arc<dyn JobQueue>,
    handler: Arc<dyn JobHandler>,
    audit: Arc<dyn DeliveryLogRepository>,
    config: WorkerConfig,
}

impl QueueWorker {
    pub fn new(
        queue_name: QueueName,
        queue: Arc<dyn JobQueue>,
        handler: Arc<dyn JobHandler>,
        audit: Arc<dyn DeliveryLogRepository>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue_name,
            queue,
            handler,
            audit,
            config,
        }
    }

    pub fn queue_name(&self) -> QueueName {
        self.queue_name
    }

    /// Receives and settles at most one message.
    pub async fn process_one(&self) -> Result<Disposition, DomainError> {
        match self.queue.receive(self.queue_name).await? {
            Some(delivery) => self.settle(delivery).await,
            None => Ok(Disposition::Idle),
        }
    }

    /// Processes messages until the queue is empty. Returns how many were
    /// settled. Intended for tests and one-shot drains.
    pub async fn drain(&self) -> Result<usize, DomainError> {
        let mut settled = 0;
        while self.process_one().await? != Disposition::Idle {
            settled += 1;
        }
        Ok(settled)
    }

    /// Runs the handler on `delivery` and acks or nacks it.
    pub async fn settle(&self, delivery: Delivery) -> Result<Disposition, DomainError> {
        let attempt = delivery.message.attempt();
        let message_id = delivery.message.id;
        if let Some(reason) = &delivery.decode_error {
            let err = JobError::Malformed(format!("undecodable queue entry: {reason}"));
            error!(
                queue = %self.queue_name,
                error = %err,
                "Undecodable message, dead-lettering"
            );
            self.queue.nack(&delivery, false).await?;
            self.record_dead_letter(&delivery, &err).await;
            return Ok(Disposition::DeadLettered { attempt });
        }
        debug!(queue = %self.queue_name, %message_id, attempt, "Handling message");

        let outcome = AssertUnwindSafe(self.handler.handle(&delivery.message))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(JobError::Transient(DomainError::queue(format!(
                    "handler {} panicked",
                    self.handler.name()
                ))))
            });

        match outcome {
            Ok(()) => {
                self.queue.ack(&delivery).await?;
                debug!(queue = %self.queue_name, %message_id, attempt, "Message acked");
                Ok(Disposition::Acked)
            }
            Err(err) if err.is_retryable() && attempt < self.config.max_attempts => {
                warn!(
                    queue = %self.queue_name,
                    %message_id,
                    attempt,
                    max_attempts = self.config.max_attempts,
                    error = %err,
                    "Handler failed, requeueing"
                );
                self.queue.nack(&delivery, true).await?;
                Ok(Disposition::Requeued { attempt })
            }
            Err(err) => {
                error!(
                    queue = %self.queue_name,
                    %message_id,
                    attempt,
                    error = %err,
                    "Giving up on message, dead-lettering"
                );
                self.queue.nack(&delivery, false).await?;
                self.record_dead_letter(&delivery, &err).await;
                Ok(Disposition::DeadLettered { attempt })
            }
        }
    }

    async fn record_dead_letter(&self, delivery: &Delivery, err: &JobError) {
        let entry = WebhookDeliveryLog::failure(
            format!("queue.{}.dead_lettered", self.queue_name),
            json!({
                "queue": self.queue_name.as_str(),
                "messageId": delivery.message.id.to_string(),
                "attempt": delivery.message.attempt(),
                "data": delivery.message.data,
            }),
            LogSource::Queue,
            err.to_string(),
        );
        if let Err(e) = self.audit.append(&entry).await {
            warn!(queue = %self.queue_name, error = %e, "Failed to write dead-letter audit record");
        }
    }

    /// Runs the consumer loop until `shutdown` flips to `true`.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        let permits = Arc::new(Semaphore::new(self.config.concurrency));
        info!(
            queue = %self.queue_name,
            handler = self.handler.name(),
            concurrency = self.config.concurrency,
            "Worker started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let permit = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                permit = permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            match self.queue.receive(self.queue_name).await {
                Ok(Some(delivery)) => {
                    let worker = Arc::clone(&self);
                    tokio::spawn(async move {
                        if let Err(e) = worker.settle(delivery).await {
                            error!(queue = %worker.queue_name, error = %e, "Failed to settle message");
                        }
                        drop(permit);
                    });
                }
                Ok(None) => {
                    drop(permit);
                    self.idle(&mut shutdown).await;
                }
                Err(e) => {
                    drop(permit);
                    warn!(queue = %self.queue_name, error = %e, "Receive failed");
                    self.idle(&mut shutdown).await;
                }
            }
        }

        info!(queue = %self.queue_name, "Worker stopping, waiting for in-flight messages");
        let all = self.config.concurrency as u32;
        match time::timeout(self.config.shutdown_grace, permits.acquire_many(all)).await {
            Ok(_) => info!(queue = %self.queue_name, "Worker stopped"),
            Err(_) => warn!(
                queue = %self.queue_name,
                grace_secs = self.config.shutdown_grace.as_secs(),
                "In-flight handlers did not finish before the grace period"
            ),
        }
        Ok(())
    }

    async fn idle(&self, shutdown: &mut watch::Receiver<bool>) {
        tokio::select! {
            _ = shutdown.changed() => {}
            _ = time::sleep(self.config.poll_interval) => {}
        }
    }
}
