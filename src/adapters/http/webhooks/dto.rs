//! Request and response bodies for the webhook endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::webhook::{DeliveryLogFilter, DeliveryStatus, LogSource, WebhookDeliveryLog};

/// Query string for `GET /webhooks/logs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryLogQuery {
    pub event: Option<String>,
    pub source: Option<LogSource>,
    pub status: Option<DeliveryStatus>,
    pub limit: Option<u32>,
}

impl DeliveryLogQuery {
    /// Caps the limit at 500.
    pub fn into_filter(self) -> DeliveryLogFilter {
        DeliveryLogFilter {
            event: self.event,
            source: self.source,
            status: self.status,
            limit: self.limit.map(|l| l.min(500)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedResponse {
    pub received: bool,
    pub message_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLogListResponse {
    pub count: usize,
    pub logs: Vec<WebhookDeliveryLog>,
}

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_caps_limit() {
        let query = DeliveryLogQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(query.into_filter().limit, Some(500));
    }

    #[test]
    fn query_parses_lowercase_enums() {
        let query: DeliveryLogQuery =
            serde_json::from_str(r#"{"source":"email","status":"failed"}"#).unwrap();
        let filter = query.into_filter();
        assert_eq!(filter.source, Some(LogSource::Email));
        assert_eq!(filter.status, Some(DeliveryStatus::Failed));
        assert_eq!(filter.effective_limit(), DeliveryLogFilter::DEFAULT_LIMIT);
    }
}
