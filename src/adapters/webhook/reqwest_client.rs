//! reqwest-backed outbound webhook client.

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::webhook::HttpMethod;
use crate::ports::{DeliveryError, OutboundRequest, WebhookClient};

#[derive(Clone)]
pub struct ReqwestWebhookClient {
    client: Client,
}

impl ReqwestWebhookClient {
    /// Per-request timeouts come from each `OutboundRequest`.
    pub fn new() -> Result<Self, DomainError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(3))
            .build()
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn method(m: HttpMethod) -> Method {
    match m {
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Get => Method::GET,
    }
}

#[async_trait]
impl WebhookClient for ReqwestWebhookClient {
    async fn send(&self, request: &OutboundRequest) -> Result<u16, DeliveryError> {
        let mut builder = self
            .client
            .request(method(request.method), &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.method != HttpMethod::Get {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                DeliveryError::Timeout
            } else if e.is_builder() {
                DeliveryError::InvalidRequest(e.to_string())
            } else {
                DeliveryError::Connect(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            Ok(status)
        } else {
            Err(DeliveryError::Status(status))
        }
    }
}

impl std::fmt::Debug for ReqwestWebhookClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestWebhookClient").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn unreachable_endpoint_is_a_connect_error() {
        let client = ReqwestWebhookClient::new().unwrap();
        let request = OutboundRequest {
            method: HttpMethod::Post,
            url: "http://127.0.0.1:9/hook".into(),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: b"{}".to_vec(),
            timeout: Duration::from_secs(1),
        };
        let err = client.send(&request).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Connect(_) | DeliveryError::Timeout));
    }

    #[test]
    fn maps_methods() {
        assert_eq!(method(HttpMethod::Put), Method::PUT);
    }
}
