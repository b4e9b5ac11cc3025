//! Named durable queues.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// The four queues the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueName {
    Moderation,
    Summary,
    Notifications,
    Webhooks,
}

impl QueueName {
    pub const ALL: [QueueName; 4] = [
        QueueName::Moderation,
        QueueName::Summary,
        QueueName::Notifications,
        QueueName::Webhooks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueName::Moderation => "moderation",
            QueueName::Summary => "summary",
            QueueName::Notifications => "notifications",
            QueueName::Webhooks => "webhooks",
        }
    }

    /// Default in-flight ceiling. Bounds load on the scoring model and on
    /// outbound HTTP.
    pub fn default_concurrency(&self) -> usize {
        match self {
            QueueName::Moderation => 5,
            QueueName::Summary => 2,
            QueueName::Notifications => 10,
            QueueName::Webhooks => 5,
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueueName::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| ValidationError::invalid_format("queue", format!("unknown queue '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_concurrency_per_queue() {
        assert_eq!(QueueName::Moderation.default_concurrency(), 5);
        assert_eq!(QueueName::Summary.default_concurrency(), 2);
        assert_eq!(QueueName::Notifications.default_concurrency(), 10);
        assert_eq!(QueueName::Webhooks.default_concurrency(), 5);
    }

    #[test]
    fn names_parse_back() {
        for q in QueueName::ALL {
            assert_eq!(q.as_str().parse::<QueueName>().unwrap(), q);
        }
        assert!("email".parse::<QueueName>().is_err());
    }
}
