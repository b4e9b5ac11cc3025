//! Real-time fan-out adapters.

mod recording;
mod redis_publisher;
mod redis_relay;
mod rooms;

pub use recording::RecordingRealtimePublisher;
pub use redis_publisher::{RedisRealtimePublisher, CHANNEL_PREFIX};
pub use redis_relay::RedisRealtimeRelay;
pub use rooms::{ClientId, TopicRooms};
