//! IngestEmailStatusHandler - inbound email-provider delivery reports.
//!
//! Verifies the signature over the raw body, records the report in the
//! delivery log and forwards it to the webhook queue as `email-status`.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::foundation::{DomainError, Timestamp, ValidationError};
use crate::domain::jobs::{QueueName, WebhookJob};
use crate::domain::webhook::{
    EmailStatusReport, LogSource, SignatureError, WebhookDeliveryLog, WebhookSigner, EMAIL_STATUS,
    SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use crate::ports::{publish_job, DeliveryLogRepository, JobQueue};

/// Why an inbound report was refused.
#[derive(Debug, Clone, Error)]
pub enum IngestError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] SignatureError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(#[from] DomainError),
}

impl From<ValidationError> for IngestError {
    fn from(err: ValidationError) -> Self {
        IngestError::BadRequest(err.to_string())
    }
}

pub struct IngestEmailStatusHandler {
    signer: WebhookSigner,
    audit: Arc<dyn DeliveryLogRepository>,
    queue: Arc<dyn JobQueue>,
    /// Zero disables the freshness check.
    max_age: Duration,
}

impl IngestEmailStatusHandler {
    pub fn new(
        signer: WebhookSigner,
        audit: Arc<dyn DeliveryLogRepository>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            signer,
            audit,
            queue,
            max_age: Duration::from_secs(300),
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Authenticates and accepts one report.
    ///
    /// `timestamp` and `signature` are the raw header values.
    pub async fn ingest(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<EmailStatusReport, IngestError> {
        let timestamp = timestamp.ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?;
        let signature = signature.ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?;

        if self.max_age.is_zero() {
            self.signer.verify(timestamp, body, signature)?;
        } else {
            self.signer.verify_fresh(
                timestamp,
                body,
                signature,
                Timestamp::now().as_unix_millis(),
                self.max_age.as_millis() as i64,
            )?;
        }

        let report: EmailStatusReport =
            serde_json::from_slice(body).map_err(|e| IngestError::BadRequest(e.to_string()))?;
        report.validate()?;

        let payload = serde_json::to_value(&report).map_err(DomainError::from)?;

        self.audit
            .append(&WebhookDeliveryLog::success(
                report.log_event(),
                payload.clone(),
                LogSource::Email,
            ))
            .await?;

        if let Err(e) = publish_job(
            self.queue.as_ref(),
            QueueName::Webhooks,
            &WebhookJob::event(EMAIL_STATUS, payload),
        )
        .await
        {
            warn!(message_id = %report.message_id, error = %e, "Failed to forward email status");
            return Err(e.into());
        }

        info!(
            event = %report.event,
            message_id = %report.message_id,
            "Email status accepted"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryDeliveryLog;
    use crate::adapters::queue::InMemoryJobQueue;
    use secrecy::Secret;
    use serde_json::json;

    const SECRET: &str = "email-secret";

    fn signer() -> WebhookSigner {
        WebhookSigner::new(Secret::new(SECRET.to_string()))
    }

    fn body() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "event": "bounced",
            "messageId": "msg-42",
            "recipient": "reader@example.com",
            "timestamp": "2024-05-01T10:00:00Z",
            "reason": "mailbox full"
        }))
        .unwrap()
    }

    struct Fixture {
        audit: Arc<InMemoryDeliveryLog>,
        queue: Arc<InMemoryJobQueue>,
        handler: IngestEmailStatusHandler,
    }

    fn fixture() -> Fixture {
        let audit = Arc::new(InMemoryDeliveryLog::new());
        let queue = Arc::new(InMemoryJobQueue::new());
        let handler = IngestEmailStatusHandler::new(signer(), audit.clone(), queue.clone());
        Fixture {
            audit,
            queue,
            handler,
        }
    }

    fn now() -> String {
        Timestamp::now().as_unix_millis().to_string()
    }

    #[tokio::test]
    async fn valid_report_is_logged_and_forwarded() {
        let fx = fixture();
        let body = body();
        let ts = now();
        let sig = signer().sign(&ts, &body);

        let report = fx.handler.ingest(Some(&ts), Some(&sig), &body).await.unwrap();

        assert_eq!(report.message_id, "msg-42");
        let logs = fx.audit.entries().await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].event, "email.bounced");
        assert_eq!(logs[0].source, LogSource::Email);

        let jobs: Vec<WebhookJob> = fx.queue.published_jobs(QueueName::Webhooks).await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].event_name, EMAIL_STATUS);
        assert_eq!(jobs[0].payload["messageId"], "msg-42");
    }

    #[tokio::test]
    async fn tampered_body_is_unauthorized_and_leaves_no_trace() {
        let fx = fixture();
        let ts = now();
        let sig = signer().sign(&ts, &body());
        let mut tampered = body();
        tampered[5] ^= 1;

        let err = fx.handler.ingest(Some(&ts), Some(&sig), &tampered).await.unwrap_err();

        assert!(matches!(
            err,
            IngestError::Unauthorized(SignatureError::InvalidSignature)
        ));
        assert!(fx.audit.entries().await.is_empty());
        assert_eq!(fx.queue.pending_count(QueueName::Webhooks).await, 0);
    }

    #[tokio::test]
    async fn missing_headers_are_unauthorized() {
        let fx = fixture();
        let err = fx.handler.ingest(None, Some("ab"), &body()).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::Unauthorized(SignatureError::MissingHeader(TIMESTAMP_HEADER))
        ));
        let err = fx.handler.ingest(Some(&now()), None, &body()).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::Unauthorized(SignatureError::MissingHeader(SIGNATURE_HEADER))
        ));
    }

    #[tokio::test]
    async fn stale_timestamp_is_rejected_unless_check_disabled() {
        let fx = fixture();
        let body = body();
        let stale = (Timestamp::now().as_unix_millis() - 3_600_000).to_string();
        let sig = signer().sign(&stale, &body);

        let err = fx.handler.ingest(Some(&stale), Some(&sig), &body).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::Unauthorized(SignatureError::TimestampOutOfRange)
        ));

        let lenient = fixture().handler.with_max_age(Duration::ZERO);
        assert!(lenient.ingest(Some(&stale), Some(&sig), &body).await.is_ok());
    }

    #[tokio::test]
    async fn signed_but_invalid_report_is_bad_request() {
        let fx = fixture();
        let body = serde_json::to_vec(&json!({
            "event": "delivered",
            "messageId": "",
            "recipient": "reader@example.com",
            "timestamp": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        let ts = now();
        let sig = signer().sign(&ts, &body);

        let err = fx.handler.ingest(Some(&ts), Some(&sig), &body).await.unwrap_err();
        assert!(matches!(err, IngestError::BadRequest(_)));
    }

    #[tokio::test]
    async fn queue_outage_is_internal() {
        let fx = fixture();
        fx.queue.set_fail_publish(true);
        let body = body();
        let ts = now();
        let sig = signer().sign(&ts, &body);

        let err = fx.handler.ingest(Some(&ts), Some(&sig), &body).await.unwrap_err();
        assert!(matches!(err, IngestError::Internal(_)));
    }
}
