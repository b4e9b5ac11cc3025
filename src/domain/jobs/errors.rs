//! Job-level failure classification.

use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Why a handler could not finish a job.
#[derive(Debug, Clone, Error)]
pub enum JobError {
    /// Payload does not decode. Retrying cannot help.
    #[error("malformed job payload: {0}")]
    Malformed(String),

    /// Infrastructure failure. Eligible for broker-level retry.
    #[error("transient failure: {0}")]
    Transient(#[from] DomainError),
}

impl JobError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::Transient(_))
    }
}
