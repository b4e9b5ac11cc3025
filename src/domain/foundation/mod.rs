//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, state machines and error types that form the
//! vocabulary of the forum pipeline.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ContentId, MessageId, NotificationId, SubscriptionId, ThreadId, TicketId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
