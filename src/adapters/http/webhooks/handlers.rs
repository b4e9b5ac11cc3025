//! HTTP handlers for webhook endpoints.

use std::sync::Arc;

use axum::extract::{Json, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use tracing::warn;

use crate::application::{IngestEmailStatusHandler, IngestError};
use crate::domain::foundation::DomainError;
use crate::domain::webhook::{SignatureError, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::ports::DeliveryLogRepository;

use super::dto::{AcceptedResponse, DeliveryLogListResponse, DeliveryLogQuery, ErrorResponse};

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhookAppState {
    pub ingest: Arc<IngestEmailStatusHandler>,
    pub audit: Arc<dyn DeliveryLogRepository>,
}

/// POST /webhooks/email-status - Delivery report from the email provider
pub async fn handle_email_status(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let report = state
        .ingest
        .ingest(header(TIMESTAMP_HEADER), header(SIGNATURE_HEADER), &body)
        .await?;

    Ok((
        StatusCode::OK,
        Json(AcceptedResponse {
            received: true,
            message_id: report.message_id,
        }),
    ))
}

/// GET /webhooks/logs - Read back the delivery log, newest first
pub async fn list_delivery_logs(
    State(state): State<WebhookAppState>,
    Query(query): Query<DeliveryLogQuery>,
) -> Result<Json<DeliveryLogListResponse>, WebhookApiError> {
    let logs = state.audit.query(&query.into_filter()).await?;
    Ok(Json(DeliveryLogListResponse {
        count: logs.len(),
        logs,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts ingestion errors to HTTP responses.
#[derive(Debug)]
pub struct WebhookApiError(IngestError);

impl From<IngestError> for WebhookApiError {
    fn from(err: IngestError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for WebhookApiError {
    fn from(err: DomainError) -> Self {
        Self(IngestError::Internal(err))
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message) = match &self.0 {
            IngestError::Unauthorized(SignatureError::MissingHeader(name)) => (
                StatusCode::UNAUTHORIZED,
                "MISSING_SIGNATURE",
                format!("Missing {} header", name),
            ),
            IngestError::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_WEBHOOK_SIGNATURE",
                "Invalid webhook signature".to_string(),
            ),
            IngestError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, "INVALID_PAYLOAD", reason.clone())
            }
            IngestError::Internal(err) => {
                warn!(error = %err, "Webhook request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(error_code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_maps_missing_header_to_401() {
        let err = WebhookApiError(IngestError::Unauthorized(SignatureError::MissingHeader(
            SIGNATURE_HEADER,
        )));
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn api_error_maps_bad_signature_to_401() {
        let err = WebhookApiError(IngestError::Unauthorized(SignatureError::InvalidSignature));
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn api_error_maps_stale_timestamp_to_401() {
        let err = WebhookApiError(IngestError::Unauthorized(
            SignatureError::TimestampOutOfRange,
        ));
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn api_error_maps_bad_request_to_400() {
        let err = WebhookApiError(IngestError::BadRequest("missing field".into()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_maps_infrastructure_to_500() {
        let err = WebhookApiError::from(DomainError::queue("broker down"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
