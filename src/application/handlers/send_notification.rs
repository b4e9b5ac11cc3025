//! SendNotificationHandler - consumer of the `notifications` queue.
//!
//! Persisting the notification is the only step that can fail the job.
//! The real-time push and the `notification.sent` webhook dispatch run
//! afterwards and report failures as [`SideEffectError`]s. A failed push is
//! also written to the delivery log.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::SideEffectError;
use crate::domain::foundation::{DomainError, NotificationId};
use crate::domain::jobs::{JobError, NotificationJob, QueueMessage, QueueName, WebhookJob};
use crate::domain::notification::{Notification, NotificationContext, RETENTION_DAYS};
use crate::domain::webhook::{
    notification_sent_payload, LogSource, WebhookDeliveryLog, NOTIFICATION_SENT,
};
use crate::ports::{
    publish_job, DeliveryLogRepository, JobHandler, JobQueue, NotificationRepository,
    RealtimeEvent, RealtimePublisher, ThreadRepository, Topic, UserDirectory,
    WebhookSubscriptionRepository, NOTIFICATION_NEW,
};

/// What a processed notification job did.
#[derive(Debug, Clone)]
pub struct NotificationReport {
    pub notification_id: NotificationId,
    pub pushed: bool,
    pub webhook_enqueued: bool,
    pub side_effect_errors: Vec<SideEffectError>,
}

pub struct SendNotificationHandler {
    notifications: Arc<dyn NotificationRepository>,
    threads: Arc<dyn ThreadRepository>,
    users: Arc<dyn UserDirectory>,
    realtime: Arc<dyn RealtimePublisher>,
    subscriptions: Arc<dyn WebhookSubscriptionRepository>,
    queue: Arc<dyn JobQueue>,
    audit: Arc<dyn DeliveryLogRepository>,
    retention_days: i64,
}

impl SendNotificationHandler {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        threads: Arc<dyn ThreadRepository>,
        users: Arc<dyn UserDirectory>,
        realtime: Arc<dyn RealtimePublisher>,
        subscriptions: Arc<dyn WebhookSubscriptionRepository>,
        queue: Arc<dyn JobQueue>,
        audit: Arc<dyn DeliveryLogRepository>,
    ) -> Self {
        Self {
            notifications,
            threads,
            users,
            realtime,
            subscriptions,
            queue,
            audit,
            retention_days: RETENTION_DAYS,
        }
    }

    pub fn with_retention_days(mut self, days: i64) -> Self {
        self.retention_days = days;
        self
    }

    pub async fn send(&self, job: &NotificationJob) -> Result<NotificationReport, JobError> {
        let ctx = self.resolve_context(job).await;
        let mut notification = Notification::compose(job, &ctx);
        notification.expires_at = notification.created_at.plus_days(self.retention_days);

        self.notifications.insert(&notification).await?;
        info!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            kind = notification.kind.as_str(),
            "Notification stored"
        );

        let mut report = NotificationReport {
            notification_id: notification.id,
            pushed: false,
            webhook_enqueued: false,
            side_effect_errors: Vec::new(),
        };

        match self.push(&notification).await {
            Ok(()) => report.pushed = true,
            Err(e) => {
                self.record_push_failure(&notification, &e).await;
                report.side_effect_errors.push(e);
            }
        }

        match self.dispatch_webhook(&notification).await {
            Ok(enqueued) => report.webhook_enqueued = enqueued,
            Err(e) => report.side_effect_errors.push(e),
        }

        for err in &report.side_effect_errors {
            warn!(
                notification_id = %notification.id,
                side_effect = err.kind(),
                error = %err,
                "Notification side effect failed"
            );
        }
        Ok(report)
    }

    /// Thread title and actor name, with placeholders for anything missing.
    async fn resolve_context(&self, job: &NotificationJob) -> NotificationContext {
        let thread_title = match job.thread_id() {
            Some(id) => match self.threads.find_by_id(&id).await {
                Ok(thread) => thread.map(|t| t.title),
                Err(e) => {
                    warn!(thread_id = %id, error = %e, "Thread lookup failed, using placeholder");
                    None
                }
            },
            None => None,
        };
        let actor_name = match job.actor_id() {
            Some(id) => match self.users.display_name(&id).await {
                Ok(name) => name,
                Err(e) => {
                    warn!(actor_id = %id, error = %e, "Actor lookup failed, using placeholder");
                    None
                }
            },
            None => None,
        };
        NotificationContext {
            thread_title,
            actor_name,
        }
    }

    async fn push(&self, notification: &Notification) -> Result<(), SideEffectError> {
        let payload = serde_json::to_value(notification)
            .map_err(|e| SideEffectError::Realtime(DomainError::from(e)))?;
        self.realtime
            .publish(
                Topic::User(notification.user_id),
                RealtimeEvent::new(NOTIFICATION_NEW, payload),
            )
            .await
            .map_err(SideEffectError::Realtime)
    }

    async fn record_push_failure(&self, notification: &Notification, err: &SideEffectError) {
        let entry = WebhookDeliveryLog::failure(
            format!("{NOTIFICATION_NEW}.failed"),
            notification_sent_payload(notification),
            LogSource::Notification,
            err.to_string(),
        );
        if let Err(audit_err) = self.audit.append(&entry).await {
            warn!(error = %audit_err, "Failed to audit realtime push failure");
        }
    }

    /// Enqueues a `notification.sent` webhook job when anyone subscribes to
    /// it, recording the dispatch in the delivery log.
    async fn dispatch_webhook(&self, notification: &Notification) -> Result<bool, SideEffectError> {
        let subscribers = self
            .subscriptions
            .find_active_for_event(NOTIFICATION_SENT)
            .await
            .map_err(SideEffectError::WebhookEnqueue)?;
        if subscribers.is_empty() {
            debug!(notification_id = %notification.id, "No notification.sent subscribers");
            return Ok(false);
        }

        let payload = notification_sent_payload(notification);
        let job = WebhookJob::event(NOTIFICATION_SENT, payload.clone());

        if let Err(e) = publish_job(self.queue.as_ref(), QueueName::Webhooks, &job).await {
            let entry = WebhookDeliveryLog::failure(
                NOTIFICATION_SENT,
                payload,
                LogSource::Notification,
                e.to_string(),
            );
            if let Err(audit_err) = self.audit.append(&entry).await {
                warn!(error = %audit_err, "Failed to audit webhook enqueue failure");
            }
            return Err(SideEffectError::WebhookEnqueue(e));
        }

        self.audit
            .append(&WebhookDeliveryLog::success(
                NOTIFICATION_SENT,
                payload,
                LogSource::Notification,
            ))
            .await
            .map_err(SideEffectError::Audit)?;
        Ok(true)
    }
}

#[async_trait]
impl JobHandler for SendNotificationHandler {
    fn name(&self) -> &'static str {
        "send_notification"
    }

    async fn handle(&self, message: &QueueMessage) -> Result<(), JobError> {
        let job: NotificationJob = message.payload_as()?;
        self.send(&job).await.map(|_| ())
    }
}
