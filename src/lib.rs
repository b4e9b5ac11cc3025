//! Forum Pipeline - asynchronous processing for a discussion forum
//!
//! Durable job queues feed moderation, summary, notification and webhook
//! workers. Thread reads go through a cache that writes invalidate, and
//! state changes fan out to real-time subscribers.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
