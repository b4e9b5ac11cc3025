//! DeliverWebhookHandler - consumer of the `webhooks` queue.
//!
//! Every target (matching subscriptions plus an optional ad hoc URL) gets
//! its own signed request and retry loop, all running concurrently. The
//! handler owns its retries: delivery failures are logged and the job is
//! still acked.

use async_trait::async_trait;
use futures::future::join_all;
use secrecy::Secret;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::domain::foundation::Timestamp;
use crate::domain::jobs::{JobError, QueueMessage, WebhookJob};
use crate::domain::webhook::{
    HttpMethod, LogSource, WebhookDeliveryLog, WebhookEnvelope, WebhookSigner, EMAIL_STATUS,
    EVENT_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use crate::ports::{
    DeliveryError, DeliveryLogRepository, JobHandler, OutboundRequest, WebhookClient,
    WebhookSubscriptionRepository,
};

pub const DEFAULT_USER_AGENT: &str = "ForumPipeline-Webhook/1.0";

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub timeout: Duration,
    /// Total attempts per target, including the first.
    pub attempts: u32,
    /// Wait before retry `n` is `backoff_base * 2^(n-1)`.
    pub backoff_base: Duration,
    pub user_agent: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            attempts: 3,
            backoff_base: Duration::from_secs(1),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl DeliveryConfig {
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(failed_attempt.saturating_sub(1))
    }
}

/// One endpoint to deliver to.
#[derive(Clone)]
struct Target {
    url: String,
    method: HttpMethod,
    headers: BTreeMap<String, String>,
    secret: Option<Secret<String>>,
}

/// Result of delivering one job to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    pub url: String,
    pub attempts: u32,
    pub result: Result<u16, DeliveryError>,
}

pub struct DeliverWebhookHandler {
    subscriptions: Arc<dyn WebhookSubscriptionRepository>,
    client: Arc<dyn WebhookClient>,
    audit: Arc<dyn DeliveryLogRepository>,
    config: DeliveryConfig,
}

impl DeliverWebhookHandler {
    pub fn new(
        subscriptions: Arc<dyn WebhookSubscriptionRepository>,
        client: Arc<dyn WebhookClient>,
        audit: Arc<dyn DeliveryLogRepository>,
        config: DeliveryConfig,
    ) -> Self {
        Self {
            subscriptions,
            client,
            audit,
            config,
        }
    }

    /// Delivers `job` to every target. Only a failed subscription lookup is
    /// an error; delivery failures are reported in the outcomes.
    pub async fn deliver(&self, job: &WebhookJob) -> Result<Vec<TargetOutcome>, JobError> {
        if job.event_name == EMAIL_STATUS {
            info!(
                event = %job.payload["event"],
                message_id = %job.payload["messageId"],
                "Email status received"
            );
        }

        let mut targets: Vec<Target> = self
            .subscriptions
            .find_active_for_event(&job.event_name)
            .await?
            .into_iter()
            .map(|s| Target {
                url: s.url,
                method: s.method,
                headers: s.headers,
                secret: s.secret,
            })
            .collect();
        if let Some(url) = &job.url {
            targets.push(Target {
                url: url.clone(),
                method: HttpMethod::Post,
                headers: job.headers.clone(),
                secret: job.secret.clone().map(Secret::new),
            });
        }

        if targets.is_empty() {
            info!(event = %job.event_name, "No webhook targets for event");
            return Ok(Vec::new());
        }

        let envelope = WebhookEnvelope::new(&job.event_name, job.payload.clone(), job.timestamp);
        let body = serde_json::to_vec(&envelope).map_err(|e| JobError::Malformed(e.to_string()))?;

        let outcomes = join_all(
            targets
                .iter()
                .map(|target| self.deliver_to(target, &job.event_name, &body)),
        )
        .await;

        for outcome in &outcomes {
            self.record(job, outcome).await;
        }
        Ok(outcomes)
    }

    async fn deliver_to(&self, target: &Target, event: &str, body: &[u8]) -> TargetOutcome {
        let request = self.build_request(target, event, body);
        let attempts = self.config.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.client.send(&request).await {
                Ok(status) => {
                    info!(url = %target.url, event, status, attempt, "Webhook delivered");
                    return TargetOutcome {
                        url: target.url.clone(),
                        attempts: attempt,
                        result: Ok(status),
                    };
                }
                Err(e) if attempt < attempts => {
                    let wait = self.config.backoff(attempt);
                    warn!(
                        url = %target.url,
                        event,
                        attempt,
                        error = %e,
                        retry_in_ms = wait.as_millis() as u64,
                        "Webhook attempt failed"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(url = %target.url, event, attempt, error = %e, "Webhook delivery gave up");
                    return TargetOutcome {
                        url: target.url.clone(),
                        attempts: attempt,
                        result: Err(e),
                    };
                }
            }
        }
    }

    fn build_request(&self, target: &Target, event: &str, body: &[u8]) -> OutboundRequest {
        let timestamp = Timestamp::now().as_unix_millis().to_string();
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), self.config.user_agent.clone()),
            (TIMESTAMP_HEADER.to_string(), timestamp.clone()),
            (EVENT_HEADER.to_string(), event.to_string()),
        ];
        if let Some(secret) = &target.secret {
            let signature = WebhookSigner::new(secret.clone()).sign(&timestamp, body);
            headers.push((SIGNATURE_HEADER.to_string(), signature));
        }
        headers.extend(target.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

        OutboundRequest {
            method: target.method,
            url: target.url.clone(),
            headers,
            body: body.to_vec(),
            timeout: self.config.timeout,
        }
    }

    async fn record(&self, job: &WebhookJob, outcome: &TargetOutcome) {
        let entry = match &outcome.result {
            Ok(_) => WebhookDeliveryLog::success(
                job.event_name.clone(),
                serde_json::json!({
                    "url": outcome.url,
                    "attempts": outcome.attempts,
                    "data": job.payload,
                }),
                LogSource::External,
            ),
            Err(e) => WebhookDeliveryLog::failure(
                format!("{}.failed", job.event_name),
                serde_json::json!({
                    "url": outcome.url,
                    "attempts": outcome.attempts,
                    "statusCode": e.status_code(),
                    "data": job.payload,
                }),
                LogSource::External,
                e.to_string(),
            ),
        };
        if let Err(e) = self.audit.append(&entry).await {
            warn!(url = %outcome.url, error = %e, "Failed to record webhook delivery");
        }
    }
}

#[async_trait]
impl JobHandler for DeliverWebhookHandler {
    fn name(&self) -> &'static str {
        "deliver_webhook"
    }

    async fn handle(&self, message: &QueueMessage) -> Result<(), JobError> {
        let job: WebhookJob = message.payload_as()?;
        self.deliver(&job).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryDeliveryLog, InMemoryWebhookSubscriptionRepository};
    use crate::adapters::webhook::MockWebhookClient;
    use crate::domain::webhook::{DeliveryStatus, WebhookSubscription};
    use serde_json::json;

    fn fast_config() -> DeliveryConfig {
        DeliveryConfig {
            backoff_base: Duration::from_millis(1),
            ..Default::default()
        }
    }

    struct Fixture {
        subscriptions: Arc<InMemoryWebhookSubscriptionRepository>,
        audit: Arc<InMemoryDeliveryLog>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                subscriptions: Arc::new(InMemoryWebhookSubscriptionRepository::new()),
                audit: Arc::new(InMemoryDeliveryLog::new()),
            }
        }

        fn handler(&self, client: MockWebhookClient) -> DeliverWebhookHandler {
            DeliverWebhookHandler::new(
                self.subscriptions.clone(),
                Arc::new(client),
                self.audit.clone(),
                fast_config(),
            )
        }

        async fn subscribe(&self, sub: WebhookSubscription) {
            self.subscriptions.insert(&sub).await.unwrap();
        }
    }

    fn sub(url: &str) -> WebhookSubscription {
        WebhookSubscription::new(url, vec!["post.created".into()]).unwrap()
    }

    #[test]
    fn backoff_doubles_from_base() {
        let config = DeliveryConfig::default();
        assert_eq!(config.backoff(1), Duration::from_secs(1));
        assert_eq!(config.backoff(2), Duration::from_secs(2));
        assert_eq!(config.backoff(3), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn signs_with_secret_and_appends_static_headers() {
        let fx = Fixture::new();
        fx.subscribe(
            sub("https://a.example/hook")
                .with_secret("s3cret")
                .with_header("X-Team", "forum"),
        )
        .await;
        let client = MockWebhookClient::new();
        let job = WebhookJob::event("post.created", json!({"id": 1}));

        let outcomes = fx.handler(client.clone()).deliver(&job).await.unwrap();

        assert_eq!(outcomes[0].result, Ok(200));
        let call = &client.calls()[0];
        let ts = call.header(TIMESTAMP_HEADER).unwrap();
        let signer = WebhookSigner::new(Secret::new("s3cret".to_string()));
        assert!(signer
            .verify(ts, &call.body, call.header(SIGNATURE_HEADER).unwrap())
            .is_ok());
        assert_eq!(call.header("x-team"), Some("forum"));
        assert_eq!(call.header(EVENT_HEADER), Some("post.created"));
        assert_eq!(call.header("content-type"), Some("application/json"));

        let body: serde_json::Value = serde_json::from_slice(&call.body).unwrap();
        assert_eq!(body["event"], "post.created");
        assert_eq!(body["data"], json!({"id": 1}));
        assert_eq!(body["timestamp"], job.timestamp);
    }

    #[tokio::test]
    async fn no_signature_header_without_secret() {
        let fx = Fixture::new();
        fx.subscribe(sub("https://a.example/hook")).await;
        let client = MockWebhookClient::new();

        fx.handler(client.clone())
            .deliver(&WebhookJob::event("post.created", json!({})))
            .await
            .unwrap();

        assert!(client.calls()[0].header(SIGNATURE_HEADER).is_none());
    }

    #[tokio::test]
    async fn retries_until_success() {
        let fx = Fixture::new();
        fx.subscribe(sub("https://a.example/hook")).await;
        let client = MockWebhookClient::new().failing_times(2, DeliveryError::Status(503));

        let outcomes = fx
            .handler(client.clone())
            .deliver(&WebhookJob::event("post.created", json!({})))
            .await
            .unwrap();

        assert_eq!(outcomes[0].attempts, 3);
        assert_eq!(outcomes[0].result, Ok(200));
        assert_eq!(client.call_count(), 3);
        let logs = fx.audit.entries().await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, DeliveryStatus::Success);
    }

    #[tokio::test]
    async fn gives_up_after_configured_attempts_and_logs_failure() {
        let fx = Fixture::new();
        fx.subscribe(sub("https://a.example/hook")).await;
        let client = MockWebhookClient::new().with_fallback(Err(DeliveryError::Timeout));

        let outcomes = fx
            .handler(client.clone())
            .deliver(&WebhookJob::event("post.created", json!({})))
            .await
            .unwrap();

        assert_eq!(outcomes[0].attempts, 3);
        assert_eq!(client.call_count(), 3);
        let logs = fx.audit.entries().await;
        assert_eq!(logs[0].event, "post.created.failed");
        assert_eq!(logs[0].source, LogSource::External);
        assert_eq!(logs[0].error.as_deref(), Some("request timed out"));
    }

    #[tokio::test]
    async fn one_failing_subscription_does_not_block_another() {
        let fx = Fixture::new();
        fx.subscribe(sub("https://down.example/hook")).await;
        fx.subscribe(sub("https://up.example/hook")).await;
        let client = MockWebhookClient::new();
        let failing = client.clone();

        struct Routed(MockWebhookClient);

        #[async_trait]
        impl WebhookClient for Routed {
            async fn send(&self, request: &OutboundRequest) -> Result<u16, DeliveryError> {
                let result = self.0.send(request).await;
                if request.url.contains("down") {
                    Err(DeliveryError::Connect("refused".into()))
                } else {
                    result
                }
            }
        }

        let handler = DeliverWebhookHandler::new(
            fx.subscriptions.clone(),
            Arc::new(Routed(client)),
            fx.audit.clone(),
            fast_config(),
        );
        let outcomes = handler
            .deliver(&WebhookJob::event("post.created", json!({})))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().any(|o| o.url.contains("up") && o.result == Ok(200)));
        assert!(outcomes.iter().any(|o| o.url.contains("down") && o.result.is_err()));
        assert_eq!(failing.calls_to("https://up.example/hook").len(), 1);
        assert_eq!(failing.calls_to("https://down.example/hook").len(), 3);
    }

    #[tokio::test]
    async fn ad_hoc_target_is_delivered_with_job_secret() {
        let fx = Fixture::new();
        let client = MockWebhookClient::new();
        let job = WebhookJob::event("custom", json!({"k": "v"}))
            .with_target("https://adhoc.example/in", Some("k".into()));

        fx.handler(client.clone()).deliver(&job).await.unwrap();

        let calls = client.calls_to("https://adhoc.example/in");
        assert_eq!(calls.len(), 1);
        assert!(calls[0].header(SIGNATURE_HEADER).is_some());
    }

    #[tokio::test]
    async fn event_without_targets_is_a_no_op() {
        let fx = Fixture::new();
        let client = MockWebhookClient::new();
        let outcomes = fx
            .handler(client.clone())
            .deliver(&WebhookJob::event("nobody.cares", json!({})))
            .await
            .unwrap();
        assert!(outcomes.is_empty());
        assert_eq!(client.call_count(), 0);
    }
}
