//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the pipeline to external systems:
//! - `queue` - Durable job queues (in-memory, Redis reliable lists)
//! - `cache` - TTL caches (in-memory, Redis)
//! - `realtime` - Topic fan-out (local rooms, Redis pub/sub publisher and relay)
//! - `scoring` - Moderation scoring and summaries (keyword, OpenAI, mock)
//! - `webhook` - Outbound HTTP delivery (reqwest, mock)
//! - `memory` / `postgres` - Repositories
//! - `http` - Inbound webhook routes

pub mod cache;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod queue;
pub mod realtime;
pub mod scoring;
pub mod webhook;
