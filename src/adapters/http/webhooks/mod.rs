//! Webhook HTTP module.
//!
//! Endpoints:
//! - `POST /webhooks/email-status` - Signed email delivery reports
//! - `GET /webhooks/logs` - Webhook delivery log

mod dto;
mod handlers;
mod routes;

pub use dto::{AcceptedResponse, DeliveryLogListResponse, DeliveryLogQuery, ErrorResponse};
pub use handlers::{handle_email_status, list_delivery_logs, WebhookApiError, WebhookAppState};
pub use routes::{webhook_router, webhook_routes};
