//! Notification domain module.

mod aggregate;
mod kind;

pub use aggregate::{
    Notification, NotificationContext, RETENTION_DAYS, UNKNOWN_ACTOR, UNKNOWN_THREAD,
};
pub use kind::NotificationKind;
