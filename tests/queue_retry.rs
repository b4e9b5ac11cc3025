//! Integration tests for worker retry and redelivery.
//!
//! These tests verify that:
//! 1. A handler that always fails is attempted exactly `max_attempts` times
//! 2. The message then lands on the dead-letter list with an audit record
//! 3. Malformed payloads skip retries entirely
//! 4. Messages recovered after a crash are processed once more without side effects doubling

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use forum_pipeline::adapters::memory::{
    InMemoryContentRepository, InMemoryDeliveryLog, InMemoryReviewTicketRepository,
};
use forum_pipeline::adapters::queue::InMemoryJobQueue;
use forum_pipeline::adapters::scoring::MockContentScorer;
use forum_pipeline::application::{
    moderation_job_for, Disposition, ModerateContentHandler, QueueWorker, WorkerConfig,
};
use forum_pipeline::domain::content::{
    ContentItem, LifecycleStatus, ModerationStatus, ModerationVerdict, Recommendation,
    ScoreSnapshot,
};
use forum_pipeline::domain::foundation::{DomainError, ErrorCode, ThreadId, UserId};
use forum_pipeline::domain::jobs::{JobError, QueueMessage, QueueName};
use forum_pipeline::domain::webhook::{DeliveryStatus, LogSource};
use forum_pipeline::ports::{publish_job, ContentRepository, JobHandler, JobQueue};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Handler that fails every message with the configured error.
struct FailingHandler {
    calls: AtomicUsize,
    error: JobError,
}

impl FailingHandler {
    fn transient() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            error: JobError::Transient(DomainError::new(ErrorCode::WebhookDeliveryError, "endpoint down")),
        }
    }

    fn malformed() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            error: JobError::Malformed("missing field `url`".to_string()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobHandler for FailingHandler {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn handle(&self, _message: &QueueMessage) -> Result<(), JobError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

fn worker(
    queue: Arc<InMemoryJobQueue>,
    handler: Arc<dyn JobHandler>,
    audit: Arc<InMemoryDeliveryLog>,
) -> QueueWorker {
    QueueWorker::new(
        QueueName::Webhooks,
        queue,
        handler,
        audit,
        WorkerConfig::for_queue(QueueName::Webhooks).with_max_attempts(3),
    )
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn always_failing_handler_is_attempted_three_times_then_dead_lettered() {
    let queue = Arc::new(InMemoryJobQueue::new());
    let audit = Arc::new(InMemoryDeliveryLog::new());
    let handler = Arc::new(FailingHandler::transient());
    queue
        .publish(QueueName::Webhooks, QueueMessage::new(json!({"url": "https://x.test"})))
        .await
        .unwrap();

    let worker = worker(queue.clone(), handler.clone(), audit.clone());
    assert_eq!(worker.process_one().await.unwrap(), Disposition::Requeued { attempt: 1 });
    assert_eq!(worker.process_one().await.unwrap(), Disposition::Requeued { attempt: 2 });
    assert_eq!(worker.process_one().await.unwrap(), Disposition::DeadLettered { attempt: 3 });
    assert_eq!(worker.process_one().await.unwrap(), Disposition::Idle);
    assert_eq!(handler.calls(), 3);

    let depth = queue.depth(QueueName::Webhooks).await.unwrap();
    assert_eq!(depth.pending, 0);
    assert_eq!(depth.in_flight, 0);
    assert_eq!(depth.dead, 1);

    let dead = queue.dead_letters(QueueName::Webhooks, 10).await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].data["url"], "https://x.test");

    let entries = audit.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event, "queue.webhooks.dead_lettered");
    assert_eq!(entries[0].source, LogSource::Queue);
    assert_eq!(entries[0].status, DeliveryStatus::Failed);
}

#[tokio::test]
async fn malformed_payload_is_dead_lettered_without_retry() {
    let queue = Arc::new(InMemoryJobQueue::new());
    let audit = Arc::new(InMemoryDeliveryLog::new());
    let handler = Arc::new(FailingHandler::malformed());
    queue
        .publish(QueueName::Webhooks, QueueMessage::new(json!({})))
        .await
        .unwrap();

    let worker = worker(queue.clone(), handler.clone(), audit);
    assert_eq!(worker.drain().await.unwrap(), 1);
    assert_eq!(handler.calls(), 1);
    assert_eq!(queue.depth(QueueName::Webhooks).await.unwrap().dead, 1);
}

#[tokio::test]
async fn recovered_moderation_job_is_reprocessed_idempotently() {
    let queue = Arc::new(InMemoryJobQueue::new());
    let contents = Arc::new(InMemoryContentRepository::new());
    let tickets = Arc::new(InMemoryReviewTicketRepository::new());
    let scorer = MockContentScorer::new();
    let post = ContentItem::submit(ThreadId::new(), UserId::new(), None, "see you there").unwrap();
    contents.insert(&post).await.unwrap();

    publish_job(queue.as_ref(), QueueName::Moderation, &moderation_job_for(&post))
        .await
        .unwrap();

    // A consumer takes the message and dies before acking.
    let abandoned = queue.receive(QueueName::Moderation).await.unwrap();
    assert!(abandoned.is_some());
    assert_eq!(queue.recover_in_flight(QueueName::Moderation).await.unwrap(), 1);

    let handler = Arc::new(ModerateContentHandler::new(
        Arc::new(scorer.clone()),
        contents.clone(),
        tickets.clone(),
        queue.clone(),
    ));
    let worker = QueueWorker::new(
        QueueName::Moderation,
        queue.clone(),
        handler,
        Arc::new(InMemoryDeliveryLog::new()),
        WorkerConfig::for_queue(QueueName::Moderation),
    );
    assert_eq!(worker.drain().await.unwrap(), 1);
    let first = contents.get(&post.id).await.unwrap();
    assert!(first.score_snapshot.is_some());

    // A duplicate publish of the same job converges on the same state.
    publish_job(queue.as_ref(), QueueName::Moderation, &moderation_job_for(&post))
        .await
        .unwrap();
    assert_eq!(worker.drain().await.unwrap(), 1);

    let stored = contents.get(&post.id).await.unwrap();
    assert_eq!(stored.moderation_status, ModerationStatus::Approved);
    assert_eq!(stored.score_snapshot, first.score_snapshot);
    assert_eq!(stored.score_reasoning, first.score_reasoning);
    assert!(tickets.all().await.is_empty());
    assert_eq!(queue.pending_count(QueueName::Notifications).await, 0);
    assert_eq!(scorer.moderated_texts().len(), 2);
}

#[tokio::test]
async fn redelivered_rejection_keeps_post_rejected_and_deleted() {
    let queue = Arc::new(InMemoryJobQueue::new());
    let contents = Arc::new(InMemoryContentRepository::new());
    let tickets = Arc::new(InMemoryReviewTicketRepository::new());
    let scorer = MockContentScorer::new().with_verdict(ModerationVerdict::new(
        ScoreSnapshot::new(0.9, 0.2, 0.1).unwrap(),
        Recommendation::Reject,
        "obvious spam",
    ));
    let post = ContentItem::submit(ThreadId::new(), UserId::new(), None, "buy now").unwrap();
    contents.insert(&post).await.unwrap();

    let handler = Arc::new(ModerateContentHandler::new(
        Arc::new(scorer.clone()),
        contents.clone(),
        tickets.clone(),
        queue.clone(),
    ));
    let worker = QueueWorker::new(
        QueueName::Moderation,
        queue.clone(),
        handler,
        Arc::new(InMemoryDeliveryLog::new()),
        WorkerConfig::for_queue(QueueName::Moderation),
    );

    publish_job(queue.as_ref(), QueueName::Moderation, &moderation_job_for(&post))
        .await
        .unwrap();
    assert_eq!(worker.drain().await.unwrap(), 1);
    let first = contents.get(&post.id).await.unwrap();
    assert_eq!(first.moderation_status, ModerationStatus::Rejected);
    assert_eq!(first.lifecycle, LifecycleStatus::Deleted);

    // Simulate a redelivery after a lost ack.
    publish_job(queue.as_ref(), QueueName::Moderation, &moderation_job_for(&post))
        .await
        .unwrap();
    assert_eq!(worker.drain().await.unwrap(), 1);

    let stored = contents.get(&post.id).await.unwrap();
    assert_eq!(stored.moderation_status, ModerationStatus::Rejected);
    assert_eq!(stored.lifecycle, LifecycleStatus::Deleted);
    assert_eq!(stored.score_snapshot, first.score_snapshot);
    assert_eq!(stored.score_reasoning, first.score_reasoning);
    assert_eq!(stored.recommendation, Some(Recommendation::Reject));
    // Duplicate tickets are tolerated; at least one must exist.
    assert!(!tickets.all().await.is_empty());
}
