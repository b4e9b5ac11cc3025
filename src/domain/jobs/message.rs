//! Envelope stored on the broker for every job.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::JobError;
use crate::domain::foundation::{MessageId, Timestamp};

/// A job as it travels through a queue.
///
/// `retry_count` is owned by the broker: it is zero on publish and
/// incremented each time the message is requeued after a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage<T = Value> {
    pub id: MessageId,
    pub data: T,
    /// Publish time, unix milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub retry_count: u32,
}

impl<T> QueueMessage<T> {
    pub fn new(data: T) -> Self {
        Self {
            id: MessageId::new(),
            data,
            timestamp: Timestamp::now().as_unix_millis(),
            retry_count: 0,
        }
    }

    /// 1-based attempt number of the current delivery.
    pub fn attempt(&self) -> u32 {
        self.retry_count + 1
    }
}

impl QueueMessage<Value> {
    /// Decodes the raw payload into a job type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, JobError> {
        serde_json::from_value(self.data.clone()).map_err(|e| JobError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_message_starts_at_first_attempt() {
        let msg = QueueMessage::new(json!({"threadId": "x"}));
        assert_eq!(msg.retry_count, 0);
        assert_eq!(msg.attempt(), 1);
    }

    #[test]
    fn missing_retry_count_defaults_to_zero() {
        let raw = json!({
            "id": MessageId::new(),
            "data": {"a": 1},
            "timestamp": 1_700_000_000_000_i64
        });
        let msg: QueueMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.retry_count, 0);
    }

    #[test]
    fn payload_as_reports_malformed_data() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Needs {
            field: u32,
        }
        let msg = QueueMessage::new(json!({"other": true}));
        assert!(matches!(msg.payload_as::<Needs>(), Err(JobError::Malformed(_))));
    }
}
