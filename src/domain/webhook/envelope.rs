//! Event envelopes exchanged with external systems.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::domain::foundation::{Timestamp, ValidationError};
use crate::domain::notification::Notification;

/// Fired after a notification has been persisted.
pub const NOTIFICATION_SENT: &str = "notification.sent";

/// Email provider delivery report, republished to the webhooks queue.
pub const EMAIL_STATUS: &str = "email-status";

/// Body of every outbound delivery: `{event, data, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    pub data: Value,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl WebhookEnvelope {
    pub fn new(event: impl Into<String>, data: Value, timestamp: i64) -> Self {
        Self {
            event: event.into(),
            data,
            timestamp,
        }
    }
}

/// Normalized `notification.sent` payload.
pub fn notification_sent_payload(notification: &Notification) -> Value {
    let mut data = Map::new();
    data.insert("notificationId".into(), Value::String(notification.id.to_string()));
    data.insert("type".into(), Value::String(notification.kind.as_str().into()));
    data.insert("userId".into(), Value::String(notification.user_id.to_string()));
    if let Some(thread_id) = notification.thread_id {
        data.insert("threadId".into(), Value::String(thread_id.to_string()));
    }
    if let Some(content_id) = notification.content_id {
        data.insert("contentId".into(), Value::String(content_id.to_string()));
    }
    if let Some(actor_id) = notification.actor_id {
        data.insert("actorId".into(), Value::String(actor_id.to_string()));
    }
    data.insert(
        "timestamp".into(),
        Value::from(notification.created_at.as_unix_millis()),
    );
    Value::Object(data)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailEvent {
    Delivered,
    Failed,
    Bounced,
    Spam,
    Opened,
    Clicked,
}

impl EmailEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailEvent::Delivered => "delivered",
            EmailEvent::Failed => "failed",
            EmailEvent::Bounced => "bounced",
            EmailEvent::Spam => "spam",
            EmailEvent::Opened => "opened",
            EmailEvent::Clicked => "clicked",
        }
    }
}

impl fmt::Display for EmailEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound delivery report from the email provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailStatusReport {
    pub event: EmailEvent,
    pub message_id: String,
    pub recipient: String,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl EmailStatusReport {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.message_id.trim().is_empty() {
            return Err(ValidationError::empty_field("messageId"));
        }
        if !self.recipient.contains('@') {
            return Err(ValidationError::invalid_format("recipient", "not an email address"));
        }
        Ok(())
    }

    /// Name used in the delivery log, e.g. `email.bounced`.
    pub fn log_event(&self) -> String {
        format!("email.{}", self.event)
    }
}
