//! Job queue adapters.
//!
//! - `InMemoryJobQueue` - tests and single-process runs
//! - `RedisJobQueue` - durable reliable-queue on Redis lists

mod in_memory;
mod redis;

pub use self::redis::RedisJobQueue;
pub use in_memory::InMemoryJobQueue;
