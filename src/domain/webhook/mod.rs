//! Webhook domain module.
//!
//! - `signing` - HMAC-SHA256 signatures over `timestamp.body`
//! - `subscription` - externally registered endpoints
//! - `delivery_log` - audit trail entries
//! - `envelope` - outbound body shape, event names, inbound email reports

mod delivery_log;
mod envelope;
mod signing;
mod subscription;

pub use delivery_log::{DeliveryLogFilter, DeliveryStatus, LogSource, WebhookDeliveryLog};
pub use envelope::{
    notification_sent_payload, EmailEvent, EmailStatusReport, WebhookEnvelope, EMAIL_STATUS,
    NOTIFICATION_SENT,
};
pub use signing::{
    SignatureError, WebhookSigner, EVENT_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
pub use subscription::{HttpMethod, WebhookSubscription};
