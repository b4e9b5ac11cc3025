//! Externally registered webhook endpoints.

use secrecy::Secret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{SubscriptionId, Timestamp, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Post,
    Put,
    Get,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Get => "GET",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "GET" => Ok(HttpMethod::Get),
            other => Err(ValidationError::invalid_format(
                "method",
                format!("unsupported method '{}'", other),
            )),
        }
    }
}

/// An endpoint that wants to hear about some events.
#[derive(Debug, Clone)]
pub struct WebhookSubscription {
    pub id: SubscriptionId,
    pub url: String,
    pub method: HttpMethod,
    /// Sent with every delivery, after the standard headers.
    pub headers: BTreeMap<String, String>,
    pub events: Vec<String>,
    pub secret: Option<Secret<String>>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WebhookSubscription {
    pub fn new(url: impl Into<String>, events: Vec<String>) -> Result<Self, ValidationError> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ValidationError::invalid_format(
                "url",
                "must start with http:// or https://",
            ));
        }
        if events.is_empty() {
            return Err(ValidationError::empty_field("events"));
        }
        let now = Timestamp::now();
        Ok(Self {
            id: SubscriptionId::new(),
            url,
            method: HttpMethod::Post,
            headers: BTreeMap::new(),
            events,
            secret: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(Secret::new(secret.into()));
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Timestamp::now();
    }

    /// Active and subscribed to `event`.
    pub fn matches(&self, event: &str) -> bool {
        self.is_active && self.events.iter().any(|e| e == event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_only_subscribed_events_when_active() {
        let mut sub = WebhookSubscription::new(
            "https://hooks.example.com/forum",
            vec!["notification.sent".into()],
        )
        .unwrap();

        assert!(sub.matches("notification.sent"));
        assert!(!sub.matches("email-status"));

        sub.deactivate();
        assert!(!sub.matches("notification.sent"));
    }

    #[test]
    fn rejects_non_http_url() {
        assert!(WebhookSubscription::new("ftp://x", vec!["a".into()]).is_err());
    }

    #[test]
    fn rejects_empty_event_list() {
        assert!(WebhookSubscription::new("https://x", vec![]).is_err());
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("put".parse::<HttpMethod>().unwrap(), HttpMethod::Put);
        assert!("DELETE".parse::<HttpMethod>().is_err());
    }
}
