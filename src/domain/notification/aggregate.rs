//! Persisted in-app notifications and how each job type renders into one.

use serde::{Deserialize, Serialize};

use super::NotificationKind;
use crate::domain::foundation::{ContentId, NotificationId, ThreadId, Timestamp, UserId};
use crate::domain::jobs::NotificationJob;

/// Notifications are kept for this many days after creation.
pub const RETENTION_DAYS: i64 = 90;

pub const UNKNOWN_THREAD: &str = "Unknown Thread";
pub const UNKNOWN_ACTOR: &str = "Someone";

/// Names resolved for rendering. Missing aggregates stay `None` and render
/// as placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationContext {
    pub thread_title: Option<String>,
    pub actor_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub actor_id: Option<UserId>,
    pub thread_id: Option<ThreadId>,
    pub content_id: Option<ContentId>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl Notification {
    /// Renders a job into a new unread notification.
    pub fn compose(job: &NotificationJob, ctx: &NotificationContext) -> Self {
        let title_of_thread = ctx.thread_title.as_deref().unwrap_or(UNKNOWN_THREAD);
        let actor = ctx.actor_name.as_deref().unwrap_or(UNKNOWN_ACTOR);

        let (title, message, link) = match job {
            NotificationJob::Mention { thread_id, content_id, .. } => (
                "You were mentioned".to_string(),
                format!("{} mentioned you in \"{}\"", actor, title_of_thread),
                Some(post_link(thread_id, content_id)),
            ),
            NotificationJob::Reply { thread_id, content_id, .. } => (
                "New reply to your post".to_string(),
                format!("{} replied to your post in \"{}\"", actor, title_of_thread),
                Some(post_link(thread_id, content_id)),
            ),
            NotificationJob::ThreadComment { thread_id, content_id, .. } => (
                "New comment on your thread".to_string(),
                format!("{} commented on your thread \"{}\"", actor, title_of_thread),
                Some(post_link(thread_id, content_id)),
            ),
            NotificationJob::ContentLike { thread_id, content_id, .. } => (
                "Someone liked your post".to_string(),
                format!("{} liked your post in \"{}\"", actor, title_of_thread),
                Some(post_link(thread_id, content_id)),
            ),
            NotificationJob::Follow { actor_id, .. } => (
                "New follower".to_string(),
                format!("{} started following you", actor),
                Some(format!("/profile/{}", actor_id)),
            ),
            NotificationJob::ContentCreated { thread_id, content_id, .. } => (
                "Your post has been published".to_string(),
                format!(
                    "Your post in \"{}\" is now live and being reviewed by our AI moderator",
                    title_of_thread
                ),
                Some(post_link(thread_id, content_id)),
            ),
            NotificationJob::ThreadCreated { thread_id, .. } => (
                "Your thread has been created".to_string(),
                format!("Your thread \"{}\" is now live", title_of_thread),
                Some(thread_link(thread_id)),
            ),
            NotificationJob::ModerationRejected { thread_id, reason, .. } => (
                "Your post was rejected".to_string(),
                format!(
                    "Your post in \"{}\" was removed by our AI moderator. Reason: {}",
                    title_of_thread, reason
                ),
                Some(thread_link(thread_id)),
            ),
            NotificationJob::ModerationFlagged { thread_id, content_id, reason, .. } => (
                "Your post is under review".to_string(),
                format!(
                    "Your post in \"{}\" has been flagged for manual review. Reason: {}",
                    title_of_thread, reason
                ),
                Some(post_link(thread_id, content_id)),
            ),
            NotificationJob::System { title, message, link, .. } => {
                (title.clone(), message.clone(), link.clone())
            }
        };

        let now = Timestamp::now();
        Self {
            id: NotificationId::new(),
            user_id: job.target_user_id(),
            kind: job.kind(),
            title,
            message,
            link,
            actor_id: job.actor_id(),
            thread_id: job.thread_id(),
            content_id: job.content_id(),
            is_read: false,
            read_at: None,
            created_at: now,
            expires_at: now.plus_days(RETENTION_DAYS),
        }
    }

    pub fn mark_read(&mut self) {
        if !self.is_read {
            self.is_read = true;
            self.read_at = Some(Timestamp::now());
        }
    }

    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        !now.is_before(&self.expires_at)
    }
}

fn thread_link(thread_id: &ThreadId) -> String {
    format!("/threads/{}", thread_id)
}

fn post_link(thread_id: &ThreadId, content_id: &ContentId) -> String {
    format!("/threads/{}#post-{}", thread_id, content_id)
}
