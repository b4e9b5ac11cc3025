//! WebhookClient port - Outbound HTTP for webhook deliveries.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::webhook::HttpMethod;

/// A fully prepared delivery request.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    /// In send order. Later entries with the same name win.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub timeout: Duration,
}

impl OutboundRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("endpoint responded with status {0}")]
    Status(u16),

    #[error("request could not be built: {0}")]
    InvalidRequest(String),
}

impl DeliveryError {
    /// HTTP status, if the endpoint answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DeliveryError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

#[async_trait]
pub trait WebhookClient: Send + Sync {
    /// Sends the request. Any non-2xx answer is a `DeliveryError::Status`.
    async fn send(&self, request: &OutboundRequest) -> Result<u16, DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive_and_last_wins() {
        let req = OutboundRequest {
            method: HttpMethod::Post,
            url: "https://x".into(),
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                ("content-type".into(), "text/plain".into()),
            ],
            body: vec![],
            timeout: Duration::from_secs(10),
        };
        assert_eq!(req.header("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(req.header("X-Missing"), None);
    }

    #[test]
    fn only_status_errors_carry_a_code() {
        assert_eq!(DeliveryError::Status(502).status_code(), Some(502));
        assert_eq!(DeliveryError::Timeout.status_code(), None);
    }
}
