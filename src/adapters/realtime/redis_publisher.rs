//! Redis pub/sub publisher for multi-process deployments.
//!
//! Workers publish to `realtime:<topic>`; socket servers subscribe to
//! `realtime:*` and forward into their local rooms.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{RealtimeEvent, RealtimePublisher, Topic};

pub const CHANNEL_PREFIX: &str = "realtime:";

#[derive(Clone)]
pub struct RedisRealtimePublisher {
    conn: MultiplexedConnection,
}

impl RedisRealtimePublisher {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    pub fn channel_for(topic: &Topic) -> String {
        format!("{}{}", CHANNEL_PREFIX, topic)
    }
}

#[async_trait]
impl RealtimePublisher for RedisRealtimePublisher {
    async fn publish(&self, topic: Topic, event: RealtimeEvent) -> Result<(), DomainError> {
        let payload = serde_json::to_string(&event)?;
        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(Self::channel_for(&topic), payload)
            .await
            .map_err(|e: redis::RedisError| {
                DomainError::new(ErrorCode::RealtimeError, e.to_string())
            })?;
        tracing::trace!(topic = %topic, event = %event.event, receivers, "Published realtime event");
        Ok(())
    }
}

impl std::fmt::Debug for RedisRealtimePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRealtimePublisher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    #[test]
    fn channel_is_prefixed_topic() {
        let user = UserId::new();
        assert_eq!(
            RedisRealtimePublisher::channel_for(&Topic::User(user)),
            format!("realtime:user:{}", user)
        );
    }
}
