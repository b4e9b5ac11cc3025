//! Payloads carried by each queue.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::foundation::{ContentId, ThreadId, Timestamp, UserId};
use crate::domain::notification::NotificationKind;

/// `moderation` queue: score one piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationJob {
    pub content_id: ContentId,
    pub text_body: String,
    pub author_id: UserId,
}

/// `summary` queue: regenerate a thread summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryJob {
    pub thread_id: ThreadId,
}

/// `notifications` queue: one notification for one user.
///
/// Each variant carries only the references its message needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum NotificationJob {
    Mention {
        target_user_id: UserId,
        actor_id: UserId,
        thread_id: ThreadId,
        content_id: ContentId,
    },
    Reply {
        target_user_id: UserId,
        actor_id: UserId,
        thread_id: ThreadId,
        content_id: ContentId,
    },
    ThreadComment {
        target_user_id: UserId,
        actor_id: UserId,
        thread_id: ThreadId,
        content_id: ContentId,
    },
    ContentLike {
        target_user_id: UserId,
        actor_id: UserId,
        thread_id: ThreadId,
        content_id: ContentId,
    },
    Follow {
        target_user_id: UserId,
        actor_id: UserId,
    },
    ContentCreated {
        target_user_id: UserId,
        thread_id: ThreadId,
        content_id: ContentId,
    },
    ThreadCreated {
        target_user_id: UserId,
        thread_id: ThreadId,
    },
    ModerationRejected {
        target_user_id: UserId,
        thread_id: ThreadId,
        content_id: ContentId,
        reason: String,
    },
    ModerationFlagged {
        target_user_id: UserId,
        thread_id: ThreadId,
        content_id: ContentId,
        reason: String,
    },
    System {
        target_user_id: UserId,
        title: String,
        message: String,
        link: Option<String>,
    },
}

impl NotificationJob {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationJob::Mention { .. } => NotificationKind::Mention,
            NotificationJob::Reply { .. } => NotificationKind::Reply,
            NotificationJob::ThreadComment { .. } => NotificationKind::ThreadComment,
            NotificationJob::ContentLike { .. } => NotificationKind::ContentLike,
            NotificationJob::Follow { .. } => NotificationKind::Follow,
            NotificationJob::ContentCreated { .. } => NotificationKind::ContentCreated,
            NotificationJob::ThreadCreated { .. } => NotificationKind::ThreadCreated,
            NotificationJob::ModerationRejected { .. } => NotificationKind::ModerationRejected,
            NotificationJob::ModerationFlagged { .. } => NotificationKind::ModerationFlagged,
            NotificationJob::System { .. } => NotificationKind::System,
        }
    }

    pub fn target_user_id(&self) -> UserId {
        match self {
            NotificationJob::Mention { target_user_id, .. }
            | NotificationJob::Reply { target_user_id, .. }
            | NotificationJob::ThreadComment { target_user_id, .. }
            | NotificationJob::ContentLike { target_user_id, .. }
            | NotificationJob::Follow { target_user_id, .. }
            | NotificationJob::ContentCreated { target_user_id, .. }
            | NotificationJob::ThreadCreated { target_user_id, .. }
            | NotificationJob::ModerationRejected { target_user_id, .. }
            | NotificationJob::ModerationFlagged { target_user_id, .. }
            | NotificationJob::System { target_user_id, .. } => *target_user_id,
        }
    }

    pub fn actor_id(&self) -> Option<UserId> {
        match self {
            NotificationJob::Mention { actor_id, .. }
            | NotificationJob::Reply { actor_id, .. }
            | NotificationJob::ThreadComment { actor_id, .. }
            | NotificationJob::ContentLike { actor_id, .. }
            | NotificationJob::Follow { actor_id, .. } => Some(*actor_id),
            _ => None,
        }
    }

    pub fn thread_id(&self) -> Option<ThreadId> {
        match self {
            NotificationJob::Mention { thread_id, .. }
            | NotificationJob::Reply { thread_id, .. }
            | NotificationJob::ThreadComment { thread_id, .. }
            | NotificationJob::ContentLike { thread_id, .. }
            | NotificationJob::ContentCreated { thread_id, .. }
            | NotificationJob::ThreadCreated { thread_id, .. }
            | NotificationJob::ModerationRejected { thread_id, .. }
            | NotificationJob::ModerationFlagged { thread_id, .. } => Some(*thread_id),
            NotificationJob::Follow { .. } | NotificationJob::System { .. } => None,
        }
    }

    pub fn content_id(&self) -> Option<ContentId> {
        match self {
            NotificationJob::Mention { content_id, .. }
            | NotificationJob::Reply { content_id, .. }
            | NotificationJob::ThreadComment { content_id, .. }
            | NotificationJob::ContentLike { content_id, .. }
            | NotificationJob::ContentCreated { content_id, .. }
            | NotificationJob::ModerationRejected { content_id, .. }
            | NotificationJob::ModerationFlagged { content_id, .. } => Some(*content_id),
            _ => None,
        }
    }
}

/// `webhooks` queue: an event for external subscribers.
///
/// `url` (with optional `secret` and `headers`) adds an ad hoc target on top
/// of the registered subscriptions.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookJob {
    pub event_name: String,
    pub payload: Value,
    /// Unix milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl WebhookJob {
    pub fn event(event_name: impl Into<String>, payload: Value) -> Self {
        Self {
            event_name: event_name.into(),
            payload,
            timestamp: Timestamp::now().as_unix_millis(),
            url: None,
            secret: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_target(mut self, url: impl Into<String>, secret: Option<String>) -> Self {
        self.url = Some(url.into());
        self.secret = secret;
        self
    }
}

impl fmt::Debug for WebhookJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookJob")
            .field("event_name", &self.event_name)
            .field("timestamp", &self.timestamp)
            .field("url", &self.url)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn notification_job_is_tagged_by_type() {
        let job = NotificationJob::ModerationFlagged {
            target_user_id: UserId::new(),
            thread_id: ThreadId::new(),
            content_id: ContentId::new(),
            reason: "spam".into(),
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["type"], "moderation-flagged");
        assert!(value.get("targetUserId").is_some());
        assert_eq!(value["reason"], "spam");
    }

    #[test]
    fn follow_has_no_thread_reference() {
        let job = NotificationJob::Follow {
            target_user_id: UserId::new(),
            actor_id: UserId::new(),
        };
        assert!(job.thread_id().is_none());
        assert!(job.actor_id().is_some());
        assert_eq!(job.kind(), NotificationKind::Follow);
    }

    #[test]
    fn unknown_notification_type_fails_to_decode() {
        let raw = json!({"type": "poke", "targetUserId": UserId::new()});
        assert!(serde_json::from_value::<NotificationJob>(raw).is_err());
    }

    #[test]
    fn webhook_job_debug_redacts_secret() {
        let job = WebhookJob::event("email-status", json!({}))
            .with_target("https://hooks.example.com", Some("shh".into()));
        let debug = format!("{:?}", job);
        assert!(!debug.contains("shh"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn webhook_job_omits_empty_optionals() {
        let value = serde_json::to_value(WebhookJob::event("notification.sent", json!({"a": 1}))).unwrap();
        assert!(value.get("url").is_none());
        assert!(value.get("headers").is_none());
        assert_eq!(value["eventName"], "notification.sent");
    }
}
