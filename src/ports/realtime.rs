//! RealtimePublisher port - Topic-based push to connected clients.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, ThreadId, UserId};

pub const NOTIFICATION_NEW: &str = "notification:new";
pub const NOTIFICATION_ALL_READ: &str = "notification:all_read";
pub const THREAD_CREATED: &str = "thread:created";
pub const THREAD_UPDATED: &str = "thread:updated";
pub const THREAD_DELETED: &str = "thread:deleted";
pub const POST_CREATED: &str = "post:created";

/// Subscriber group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Private to one user.
    User(UserId),
    /// Everyone viewing a thread.
    Thread(ThreadId),
    Broadcast,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::User(id) => write!(f, "user:{}", id),
            Topic::Thread(id) => write!(f, "thread:{}", id),
            Topic::Broadcast => f.write_str("broadcast"),
        }
    }
}

impl FromStr for Topic {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::validation("topic", format!("unknown topic '{}'", s));
        if s == "broadcast" {
            return Ok(Topic::Broadcast);
        }
        match s.split_once(':') {
            Some(("user", id)) => id.parse().map(Topic::User).map_err(|_| invalid()),
            Some(("thread", id)) => id.parse().map(Topic::Thread).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

/// Named payload pushed to a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub event: String,
    pub payload: Value,
}

impl RealtimeEvent {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

#[async_trait]
pub trait RealtimePublisher: Send + Sync {
    /// Pushes to every current subscriber of `topic`. Having no subscribers
    /// is not an error.
    async fn publish(&self, topic: Topic, event: RealtimeEvent) -> Result<(), DomainError>;
}
