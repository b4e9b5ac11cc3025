//! ContentItem aggregate: a forum post (or a thread's opening post).

use serde::{Deserialize, Serialize};

use super::{LifecycleStatus, ModerationStatus, ModerationVerdict, Recommendation, ScoreSnapshot};
use crate::domain::foundation::{ContentId, ThreadId, Timestamp, UserId, ValidationError};

/// A post as the pipeline sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: ContentId,
    pub thread_id: ThreadId,
    pub author_id: UserId,
    /// Post this one replies to, if any.
    pub parent_id: Option<ContentId>,
    pub body: String,
    pub moderation_status: ModerationStatus,
    pub score_snapshot: Option<ScoreSnapshot>,
    pub score_reasoning: Option<String>,
    pub recommendation: Option<Recommendation>,
    pub lifecycle: LifecycleStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ContentItem {
    /// Creates a freshly submitted, unscored post.
    pub fn submit(
        thread_id: ThreadId,
        author_id: UserId,
        parent_id: Option<ContentId>,
        body: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(ValidationError::empty_field("body"));
        }
        let now = Timestamp::now();
        Ok(Self {
            id: ContentId::new(),
            thread_id,
            author_id,
            parent_id,
            body,
            moderation_status: ModerationStatus::Pending,
            score_snapshot: None,
            score_reasoning: None,
            recommendation: None,
            lifecycle: LifecycleStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the body and sends the item back through moderation.
    pub fn edit(&mut self, body: impl Into<String>) -> Result<(), ValidationError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(ValidationError::empty_field("body"));
        }
        self.body = body;
        self.moderation_status = ModerationStatus::Pending;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Applies a moderation decision computed by [`ModerationUpdate::from_verdict`].
    pub fn apply(&mut self, update: &ModerationUpdate) {
        self.score_snapshot = Some(update.scores);
        self.score_reasoning = Some(update.reasoning.clone());
        self.recommendation = Some(update.recommendation);
        self.moderation_status = update.status;
        if let Some(lifecycle) = update.lifecycle {
            self.lifecycle = lifecycle;
        }
        self.updated_at = Timestamp::now();
    }

    pub fn mark_deleted(&mut self) {
        self.lifecycle = LifecycleStatus::Deleted;
        self.updated_at = Timestamp::now();
    }

    /// Visible to readers and eligible for summaries.
    pub fn is_visible(&self) -> bool {
        self.lifecycle == LifecycleStatus::Active
            && self.moderation_status != ModerationStatus::Rejected
    }
}

/// Every field a moderation decision writes, persisted as one update.
///
/// Rejection carries `lifecycle = Some(Deleted)` so status and visibility
/// change together. Other outcomes leave lifecycle untouched, which keeps a
/// post deleted by its author deleted even if it scores clean.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationUpdate {
    pub content_id: ContentId,
    pub scores: ScoreSnapshot,
    pub reasoning: String,
    pub recommendation: Recommendation,
    pub status: ModerationStatus,
    pub lifecycle: Option<LifecycleStatus>,
}

impl ModerationUpdate {
    pub fn from_verdict(content_id: ContentId, verdict: &ModerationVerdict) -> Self {
        let (status, lifecycle) = match verdict.recommendation {
            Recommendation::Reject => (ModerationStatus::Rejected, Some(LifecycleStatus::Deleted)),
            Recommendation::Review => (ModerationStatus::Flagged, None),
            Recommendation::Approve => (ModerationStatus::Approved, None),
        };
        Self {
            content_id,
            scores: verdict.scores,
            reasoning: verdict.reasoning.clone(),
            recommendation: verdict.recommendation,
            status,
            lifecycle,
        }
    }
}
