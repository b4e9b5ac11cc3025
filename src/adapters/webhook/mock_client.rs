//! Scripted webhook client for tests.
//!
//! Responses are consumed in order; once the script runs out every call
//! gets the fallback (200 unless changed). Every request is recorded.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{DeliveryError, OutboundRequest, WebhookClient};

#[derive(Debug, Clone)]
pub struct MockWebhookClient {
    script: Arc<Mutex<VecDeque<Result<u16, DeliveryError>>>>,
    fallback: Result<u16, DeliveryError>,
    calls: Arc<Mutex<Vec<OutboundRequest>>>,
}

impl Default for MockWebhookClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWebhookClient {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Ok(200),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues one response.
    pub fn with_response(self, response: Result<u16, DeliveryError>) -> Self {
        self.script.lock().unwrap().push_back(response);
        self
    }

    /// Queues `times` failures before falling through.
    pub fn failing_times(self, times: usize, error: DeliveryError) -> Self {
        {
            let mut script = self.script.lock().unwrap();
            for _ in 0..times {
                script.push_back(Err(error.clone()));
            }
        }
        self
    }

    /// Response once the script is exhausted.
    pub fn with_fallback(mut self, response: Result<u16, DeliveryError>) -> Self {
        self.fallback = response;
        self
    }

    pub fn calls(&self) -> Vec<OutboundRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, url: &str) -> Vec<OutboundRequest> {
        self.calls().into_iter().filter(|c| c.url == url).collect()
    }
}

#[async_trait]
impl WebhookClient for MockWebhookClient {
    async fn send(&self, request: &OutboundRequest) -> Result<u16, DeliveryError> {
        self.calls.lock().unwrap().push(request.clone());
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }
}
