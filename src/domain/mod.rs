//! Domain layer - pure types and state transitions of the forum pipeline.

pub mod content;
pub mod foundation;
pub mod jobs;
pub mod moderation;
pub mod notification;
pub mod thread;
pub mod webhook;
