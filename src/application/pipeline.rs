//! Pipeline - owns the workers and their shared handles.
//!
//! Startup: recover in-flight messages left by a previous process, then
//! spawn one worker per queue plus the retention sweeper. Shutdown: flip the
//! watch signal, let workers finish in-flight messages within their grace
//! period, then join every task.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::handlers::{
    DeliverWebhookHandler, DeliveryConfig, ModerateContentHandler, SendNotificationHandler,
    SummarizeThreadHandler, DEFAULT_SUMMARY_TTL,
};
use super::retention::RetentionSweeper;
use super::workers::{QueueWorker, WorkerConfig, DEFAULT_MAX_ATTEMPTS};
use crate::domain::foundation::DomainError;
use crate::domain::jobs::QueueName;
use crate::domain::notification::RETENTION_DAYS;
use crate::ports::{
    Cache, ContentRepository, ContentScorer, DeliveryLogRepository, JobHandler, JobQueue,
    NotificationRepository, RealtimePublisher, ReviewTicketRepository, ThreadRepository,
    UserDirectory, WebhookClient, WebhookSubscriptionRepository,
};

/// Every injected handle the workers need.
#[derive(Clone)]
pub struct PipelineDeps {
    pub queue: Arc<dyn JobQueue>,
    pub cache: Arc<dyn Cache>,
    pub realtime: Arc<dyn RealtimePublisher>,
    pub scorer: Arc<dyn ContentScorer>,
    pub contents: Arc<dyn ContentRepository>,
    pub threads: Arc<dyn ThreadRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub tickets: Arc<dyn ReviewTicketRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub subscriptions: Arc<dyn WebhookSubscriptionRepository>,
    pub audit: Arc<dyn DeliveryLogRepository>,
    pub webhook_client: Arc<dyn WebhookClient>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub moderation_concurrency: usize,
    pub summary_concurrency: usize,
    pub notification_concurrency: usize,
    pub webhook_concurrency: usize,
    pub max_attempts: u32,
    pub poll_interval: Duration,
    pub shutdown_grace: Duration,
    pub delivery: DeliveryConfig,
    pub summary_ttl: Duration,
    pub notification_retention_days: i64,
    /// `None` disables the retention sweeper.
    pub retention_interval: Option<Duration>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            moderation_concurrency: QueueName::Moderation.default_concurrency(),
            summary_concurrency: QueueName::Summary.default_concurrency(),
            notification_concurrency: QueueName::Notifications.default_concurrency(),
            webhook_concurrency: QueueName::Webhooks.default_concurrency(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: Duration::from_millis(250),
            shutdown_grace: Duration::from_secs(30),
            delivery: DeliveryConfig::default(),
            summary_ttl: DEFAULT_SUMMARY_TTL,
            notification_retention_days: RETENTION_DAYS,
            retention_interval: Some(Duration::from_secs(3600)),
        }
    }
}

impl PipelineSettings {
    fn worker_config(&self, queue: QueueName) -> WorkerConfig {
        let concurrency = match queue {
            QueueName::Moderation => self.moderation_concurrency,
            QueueName::Summary => self.summary_concurrency,
            QueueName::Notifications => self.notification_concurrency,
            QueueName::Webhooks => self.webhook_concurrency,
        };
        WorkerConfig::for_queue(queue)
            .with_concurrency(concurrency)
            .with_max_attempts(self.max_attempts)
            .with_poll_interval(self.poll_interval)
            .with_shutdown_grace(self.shutdown_grace)
    }
}

/// Builds the handler for each queue.
pub fn build_handler(
    queue: QueueName,
    deps: &PipelineDeps,
    settings: &PipelineSettings,
) -> Arc<dyn JobHandler> {
    match queue {
        QueueName::Moderation => Arc::new(ModerateContentHandler::new(
            deps.scorer.clone(),
            deps.contents.clone(),
            deps.tickets.clone(),
            deps.queue.clone(),
        )),
        QueueName::Summary => Arc::new(
            SummarizeThreadHandler::new(
                deps.threads.clone(),
                deps.contents.clone(),
                deps.users.clone(),
                deps.scorer.clone(),
                deps.cache.clone(),
            )
            .with_ttl(settings.summary_ttl),
        ),
        QueueName::Notifications => Arc::new(
            SendNotificationHandler::new(
                deps.notifications.clone(),
                deps.threads.clone(),
                deps.users.clone(),
                deps.realtime.clone(),
                deps.subscriptions.clone(),
                deps.queue.clone(),
                deps.audit.clone(),
            )
            .with_retention_days(settings.notification_retention_days),
        ),
        QueueName::Webhooks => Arc::new(DeliverWebhookHandler::new(
            deps.subscriptions.clone(),
            deps.webhook_client.clone(),
            deps.audit.clone(),
            settings.delivery.clone(),
        )),
    }
}

/// One worker per queue, not yet running.
pub fn build_workers(deps: &PipelineDeps, settings: &PipelineSettings) -> Vec<Arc<QueueWorker>> {
    QueueName::ALL
        .iter()
        .map(|&queue| {
            Arc::new(QueueWorker::new(
                queue,
                deps.queue.clone(),
                build_handler(queue, deps, settings),
                deps.audit.clone(),
                settings.worker_config(queue),
            ))
        })
        .collect()
}

pub struct Pipeline {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<(String, JoinHandle<()>)>,
    join_timeout: Duration,
}

impl Pipeline {
    pub async fn start(deps: PipelineDeps, settings: PipelineSettings) -> Result<Self, DomainError> {
        for queue in QueueName::ALL {
            let recovered = deps.queue.recover_in_flight(queue).await?;
            if recovered > 0 {
                warn!(queue = %queue, recovered, "Recovered in-flight messages from previous run");
            }
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        for worker in build_workers(&deps, &settings) {
            let name = format!("worker:{}", worker.queue_name());
            let rx = shutdown_rx.clone();
            let handle = tokio::spawn(async move {
                let queue = worker.queue_name();
                if let Err(e) = worker.run(rx).await {
                    error!(queue = %queue, error = %e, "Worker exited with error");
                }
            });
            tasks.push((name, handle));
        }

        if let Some(interval) = settings.retention_interval {
            let sweeper = RetentionSweeper::new(deps.notifications.clone(), interval);
            tasks.push((
                "retention".to_string(),
                tokio::spawn(sweeper.run(shutdown_rx.clone())),
            ));
        }

        info!(tasks = tasks.len(), "Pipeline started");
        Ok(Self {
            shutdown_tx,
            tasks,
            join_timeout: settings.shutdown_grace + Duration::from_secs(5),
        })
    }

    /// A receiver that flips to `true` when shutdown begins.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Stops intake and waits for every task to finish.
    pub async fn shutdown(self) {
        info!("Pipeline shutting down");
        // Receivers live inside the tasks, so a send error means they are gone.
        let _ = self.shutdown_tx.send(true);

        for (name, handle) in self.tasks {
            match tokio::time::timeout(self.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(task = %name, error = %e, "Task panicked"),
                Err(_) => warn!(task = %name, "Task did not stop in time"),
            }
        }
        info!("Pipeline stopped");
    }
}
