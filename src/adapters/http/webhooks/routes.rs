//! Axum router for webhook endpoints.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{handle_email_status, list_delivery_logs, WebhookAppState};

/// Create the webhook router.
///
/// # Routes
/// - `POST /email-status` - Signed delivery reports from the email provider
/// - `GET /logs` - Delivery log query
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new()
        .route("/email-status", post(handle_email_status))
        .route("/logs", get(list_delivery_logs))
}

/// Complete HTTP surface, mounted at `/webhooks` with request tracing,
/// request ids and a request timeout.
pub fn webhook_router(state: WebhookAppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/webhooks", webhook_routes())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
