use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Enumerated notification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Mention,
    Reply,
    ThreadComment,
    ContentLike,
    Follow,
    ContentCreated,
    ThreadCreated,
    ModerationRejected,
    ModerationFlagged,
    System,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 10] = [
        NotificationKind::Mention,
        NotificationKind::Reply,
        NotificationKind::ThreadComment,
        NotificationKind::ContentLike,
        NotificationKind::Follow,
        NotificationKind::ContentCreated,
        NotificationKind::ThreadCreated,
        NotificationKind::ModerationRejected,
        NotificationKind::ModerationFlagged,
        NotificationKind::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Mention => "mention",
            NotificationKind::Reply => "reply",
            NotificationKind::ThreadComment => "thread-comment",
            NotificationKind::ContentLike => "content-like",
            NotificationKind::Follow => "follow",
            NotificationKind::ContentCreated => "content-created",
            NotificationKind::ThreadCreated => "thread-created",
            NotificationKind::ModerationRejected => "moderation-rejected",
            NotificationKind::ModerationFlagged => "moderation-flagged",
            NotificationKind::System => "system",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format("notification_kind", format!("unknown kind '{}'", s))
            })
    }
}
