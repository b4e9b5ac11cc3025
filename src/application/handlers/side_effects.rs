//! Non-fatal side-effect failures.
//!
//! Side effects that run after the durable write (real-time push, webhook
//! enqueue, audit append) report failures through this type. They are
//! logged and audited by the caller and never fail the job.

use thiserror::Error;

use crate::domain::foundation::DomainError;

#[derive(Debug, Clone, Error)]
pub enum SideEffectError {
    #[error("real-time push failed: {0}")]
    Realtime(DomainError),

    #[error("webhook enqueue failed: {0}")]
    WebhookEnqueue(DomainError),

    #[error("audit log append failed: {0}")]
    Audit(DomainError),
}

impl SideEffectError {
    pub fn kind(&self) -> &'static str {
        match self {
            SideEffectError::Realtime(_) => "realtime",
            SideEffectError::WebhookEnqueue(_) => "webhook_enqueue",
            SideEffectError::Audit(_) => "audit",
        }
    }
}
