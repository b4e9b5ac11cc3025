//! Cache adapters.

mod in_memory;
mod redis;

pub use self::redis::RedisCache;
pub use in_memory::InMemoryCache;
