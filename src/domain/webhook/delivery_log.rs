//! Append-only audit trail of webhook activity.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, ValidationError};

/// Which part of the system produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Email,
    Payment,
    Notification,
    External,
    /// Dead-lettered queue messages.
    Queue,
}

impl LogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Email => "email",
            LogSource::Payment => "payment",
            LogSource::Notification => "notification",
            LogSource::External => "external",
            LogSource::Queue => "queue",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(LogSource::Email),
            "payment" => Ok(LogSource::Payment),
            "notification" => Ok(LogSource::Notification),
            "external" => Ok(LogSource::External),
            "queue" => Ok(LogSource::Queue),
            other => Err(ValidationError::invalid_format(
                "source",
                format!("unknown source '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Success => "success",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(DeliveryStatus::Success),
            "failed" => Ok(DeliveryStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDeliveryLog {
    pub event: String,
    pub payload: Value,
    pub source: LogSource,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    pub timestamp: Timestamp,
}

impl WebhookDeliveryLog {
    pub fn success(event: impl Into<String>, payload: Value, source: LogSource) -> Self {
        Self {
            event: event.into(),
            payload,
            source,
            status: DeliveryStatus::Success,
            error: None,
            timestamp: Timestamp::now(),
        }
    }

    pub fn failure(
        event: impl Into<String>,
        payload: Value,
        source: LogSource,
        error: impl Into<String>,
    ) -> Self {
        Self {
            event: event.into(),
            payload,
            source,
            status: DeliveryStatus::Failed,
            error: Some(error.into()),
            timestamp: Timestamp::now(),
        }
    }
}

/// Filter for reading the log back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryLogFilter {
    pub event: Option<String>,
    pub source: Option<LogSource>,
    pub status: Option<DeliveryStatus>,
    pub limit: Option<u32>,
}

impl DeliveryLogFilter {
    pub const DEFAULT_LIMIT: u32 = 100;

    pub fn matches(&self, entry: &WebhookDeliveryLog) -> bool {
        self.event.as_ref().map_or(true, |e| e == &entry.event)
            && self.source.map_or(true, |s| s == entry.source)
            && self.status.map_or(true, |s| s == entry.status)
    }

    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_carries_error() {
        let entry = WebhookDeliveryLog::failure("external.x", json!({}), LogSource::External, "timeout");
        assert_eq!(entry.status, DeliveryStatus::Failed);
        assert_eq!(entry.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn filter_matches_on_set_fields_only() {
        let entry = WebhookDeliveryLog::success("email.delivered", json!({}), LogSource::Email);
        assert!(DeliveryLogFilter::default().matches(&entry));
        assert!(DeliveryLogFilter { source: Some(LogSource::Email), ..Default::default() }.matches(&entry));
        assert!(!DeliveryLogFilter { status: Some(DeliveryStatus::Failed), ..Default::default() }.matches(&entry));
    }

    #[test]
    fn filter_limit_defaults_to_100() {
        assert_eq!(DeliveryLogFilter::default().effective_limit(), 100);
    }
}
