//! ModerateContentHandler - consumer of the `moderation` queue.
//!
//! Scores a post, writes the scores and the resulting status in one update,
//! and for `review`/`reject` opens a ticket and tells the author.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::content::{ContentItem, ModerationUpdate, Recommendation};
use crate::domain::jobs::{JobError, ModerationJob, NotificationJob, QueueMessage, QueueName};
use crate::domain::moderation::ReviewTicket;
use crate::ports::{
    publish_job, ContentRepository, ContentScorer, JobHandler, JobQueue, ReviewTicketRepository,
};

/// Outcome of one moderation job, for callers that drive the handler directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationOutcome {
    /// Content no longer exists; nothing to do.
    ContentMissing,
    Decided {
        recommendation: Recommendation,
        ticket_opened: bool,
    },
}

pub struct ModerateContentHandler {
    scorer: Arc<dyn ContentScorer>,
    contents: Arc<dyn ContentRepository>,
    tickets: Arc<dyn ReviewTicketRepository>,
    queue: Arc<dyn JobQueue>,
}

impl ModerateContentHandler {
    pub fn new(
        scorer: Arc<dyn ContentScorer>,
        contents: Arc<dyn ContentRepository>,
        tickets: Arc<dyn ReviewTicketRepository>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            scorer,
            contents,
            tickets,
            queue,
        }
    }

    pub async fn moderate(&self, job: &ModerationJob) -> Result<ModerationOutcome, JobError> {
        let verdict = self.scorer.moderate(&job.text_body).await?;

        let Some(content) = self.contents.find_by_id(&job.content_id).await? else {
            info!(content_id = %job.content_id, "Content deleted before moderation, skipping");
            return Ok(ModerationOutcome::ContentMissing);
        };

        let update = ModerationUpdate::from_verdict(content.id, &verdict);
        if !self.contents.save_moderation(&update).await? {
            info!(content_id = %job.content_id, "Content vanished during moderation, skipping");
            return Ok(ModerationOutcome::ContentMissing);
        }

        info!(
            content_id = %content.id,
            recommendation = %verdict.recommendation,
            status = %update.status.as_str(),
            spam = verdict.scores.spam_score(),
            toxicity = verdict.scores.toxicity_score(),
            inappropriate = verdict.scores.inappropriate_score(),
            "Content moderated"
        );

        let notice = match verdict.recommendation {
            Recommendation::Approve => None,
            Recommendation::Review => {
                self.open_ticket(ReviewTicket::automated_review(content.id, &verdict)).await?;
                Some(NotificationJob::ModerationFlagged {
                    target_user_id: content.author_id,
                    thread_id: content.thread_id,
                    content_id: content.id,
                    reason: verdict.reasoning.clone(),
                })
            }
            Recommendation::Reject => {
                self.open_ticket(ReviewTicket::automated_rejection(content.id, &verdict)).await?;
                Some(NotificationJob::ModerationRejected {
                    target_user_id: content.author_id,
                    thread_id: content.thread_id,
                    content_id: content.id,
                    reason: verdict.reasoning.clone(),
                })
            }
        };

        let ticket_opened = notice.is_some();
        if let Some(job) = notice {
            publish_job(self.queue.as_ref(), QueueName::Notifications, &job).await?;
        }

        Ok(ModerationOutcome::Decided {
            recommendation: verdict.recommendation,
            ticket_opened,
        })
    }

    async fn open_ticket(&self, ticket: ReviewTicket) -> Result<(), JobError> {
        debug!(ticket_id = %ticket.id, status = ticket.status.as_str(), "Opening review ticket");
        self.tickets.insert(&ticket).await?;
        Ok(())
    }
}

#[async_trait]
impl JobHandler for ModerateContentHandler {
    fn name(&self) -> &'static str {
        "moderate_content"
    }

    async fn handle(&self, message: &QueueMessage) -> Result<(), JobError> {
        let job: ModerationJob = message.payload_as()?;
        self.moderate(&job).await.map(|_| ())
    }
}

/// Builds the job a producer publishes for a post.
pub fn moderation_job_for(content: &ContentItem) -> ModerationJob {
    ModerationJob {
        content_id: content.id,
        text_body: content.body.clone(),
        author_id: content.author_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryContentRepository, InMemoryReviewTicketRepository};
    use crate::adapters::queue::InMemoryJobQueue;
    use crate::adapters::scoring::MockContentScorer;
    use crate::domain::content::{LifecycleStatus, ModerationStatus, ModerationVerdict, ScoreSnapshot};
    use crate::domain::foundation::{ContentId, DomainError, ErrorCode, ThreadId, UserId};
    use crate::domain::moderation::{TicketCategory, TicketStatus};

    struct Fixture {
        contents: Arc<InMemoryContentRepository>,
        tickets: Arc<InMemoryReviewTicketRepository>,
        queue: Arc<InMemoryJobQueue>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                contents: Arc::new(InMemoryContentRepository::new()),
                tickets: Arc::new(InMemoryReviewTicketRepository::new()),
                queue: Arc::new(InMemoryJobQueue::new()),
            }
        }

        fn handler(&self, scorer: MockContentScorer) -> ModerateContentHandler {
            ModerateContentHandler::new(
                Arc::new(scorer),
                self.contents.clone(),
                self.tickets.clone(),
                self.queue.clone(),
            )
        }

        async fn post(&self, body: &str) -> ContentItem {
            let item = ContentItem::submit(ThreadId::new(), UserId::new(), None, body).unwrap();
            self.contents.insert(&item).await.unwrap();
            item
        }
    }

    fn scorer(spam: f64, toxicity: f64, inappropriate: f64, rec: Recommendation) -> MockContentScorer {
        MockContentScorer::new().with_verdict(ModerationVerdict::new(
            ScoreSnapshot::new(spam, toxicity, inappropriate).unwrap(),
            rec,
            "model says so",
        ))
    }

    #[tokio::test]
    async fn approve_sets_status_without_ticket_or_notice() {
        let fx = Fixture::new();
        let post = fx.post("hello there").await;
        let handler = fx.handler(scorer(0.1, 0.1, 0.1, Recommendation::Approve));

        let outcome = handler.moderate(&moderation_job_for(&post)).await.unwrap();

        assert_eq!(
            outcome,
            ModerationOutcome::Decided {
                recommendation: Recommendation::Approve,
                ticket_opened: false
            }
        );
        let stored = fx.contents.get(&post.id).await.unwrap();
        assert_eq!(stored.moderation_status, ModerationStatus::Approved);
        assert!(fx.tickets.all().await.is_empty());
        assert!(fx.queue.published(QueueName::Notifications).await.is_empty());
    }

    #[tokio::test]
    async fn review_flags_and_opens_pending_ticket() {
        let fx = Fixture::new();
        let post = fx.post("buy now click here").await;
        let handler = fx.handler(scorer(0.8, 0.1, 0.1, Recommendation::Review));

        handler.moderate(&moderation_job_for(&post)).await.unwrap();

        let stored = fx.contents.get(&post.id).await.unwrap();
        assert_eq!(stored.moderation_status, ModerationStatus::Flagged);
        assert_eq!(stored.lifecycle, LifecycleStatus::Active);

        let tickets = fx.tickets.all().await;
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].status, TicketStatus::Pending);
        assert_eq!(tickets[0].category, TicketCategory::Spam);

        let notices: Vec<NotificationJob> = fx.queue.published_jobs(QueueName::Notifications).await;
        assert!(matches!(
            &notices[..],
            [NotificationJob::ModerationFlagged { target_user_id, .. }] if *target_user_id == post.author_id
        ));
    }

    #[tokio::test]
    async fn reject_deletes_in_the_same_update_and_opens_reviewing_ticket() {
        let fx = Fixture::new();
        let post = fx.post("you idiot").await;
        let handler = fx.handler(scorer(0.1, 0.9, 0.1, Recommendation::Reject));

        handler.moderate(&moderation_job_for(&post)).await.unwrap();

        let stored = fx.contents.get(&post.id).await.unwrap();
        assert_eq!(stored.moderation_status, ModerationStatus::Rejected);
        assert_eq!(stored.lifecycle, LifecycleStatus::Deleted);

        let tickets = fx.tickets.find_by_content(&post.id).await.unwrap();
        assert_eq!(tickets[0].status, TicketStatus::Reviewing);
        assert_eq!(tickets[0].category, TicketCategory::Harassment);
        assert!(tickets[0].description.starts_with("AI Moderation: model says so."));

        let notices: Vec<NotificationJob> = fx.queue.published_jobs(QueueName::Notifications).await;
        assert!(matches!(
            &notices[..],
            [NotificationJob::ModerationRejected { reason, .. }] if reason == "model says so"
        ));
    }

    #[tokio::test]
    async fn missing_content_is_a_no_op() {
        let fx = Fixture::new();
        let handler = fx.handler(scorer(0.9, 0.9, 0.9, Recommendation::Reject));
        let job = ModerationJob {
            content_id: ContentId::new(),
            text_body: "gone".into(),
            author_id: UserId::new(),
        };

        assert_eq!(handler.moderate(&job).await.unwrap(), ModerationOutcome::ContentMissing);
        assert!(fx.tickets.all().await.is_empty());
    }

    #[tokio::test]
    async fn scorer_failure_is_transient_and_leaves_content_pending() {
        let fx = Fixture::new();
        let post = fx.post("hello").await;
        let handler = fx.handler(
            MockContentScorer::new().with_error(DomainError::new(ErrorCode::ScoringError, "model down")),
        );

        let err = handler.moderate(&moderation_job_for(&post)).await.unwrap_err();

        assert!(err.is_retryable());
        let stored = fx.contents.get(&post.id).await.unwrap();
        assert_eq!(stored.moderation_status, ModerationStatus::Pending);
    }

    #[tokio::test]
    async fn malformed_payload_is_not_retryable() {
        let fx = Fixture::new();
        let handler = fx.handler(MockContentScorer::new());
        let message = QueueMessage::new(serde_json::json!({"contentId": 42}));

        let err = handler.handle(&message).await.unwrap_err();
        assert!(!err.is_retryable());
    }
}
