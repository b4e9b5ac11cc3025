//! Relay from Redis pub/sub into local topic rooms.
//!
//! Runs inside the process that holds client sockets: every event a worker
//! published through [`RedisRealtimePublisher`](super::RedisRealtimePublisher)
//! is re-published into the local [`TopicRooms`].

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::redis_publisher::CHANNEL_PREFIX;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{RealtimeEvent, RealtimePublisher, Topic};

pub struct RedisRealtimeRelay {
    client: redis::Client,
    local: Arc<dyn RealtimePublisher>,
}

impl RedisRealtimeRelay {
    pub fn new(client: redis::Client, local: Arc<dyn RealtimePublisher>) -> Self {
        Self { client, local }
    }

    /// Subscribes to `realtime:*` and forwards until shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        let mut pubsub = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| DomainError::new(ErrorCode::RealtimeError, format!("relay connect failed: {}", e)))?
            .into_pubsub();
        pubsub
            .psubscribe(format!("{}*", CHANNEL_PREFIX))
            .await
            .map_err(|e| DomainError::new(ErrorCode::RealtimeError, format!("relay subscribe failed: {}", e)))?;
        info!("Realtime relay subscribed");

        let messages = pubsub.on_message();
        tokio::pin!(messages);
        loop {
            tokio::select! {
                msg = messages.next() => {
                    let Some(msg) = msg else {
                        warn!("Realtime relay stream ended");
                        break;
                    };
                    let payload: String = match msg.get_payload() {
                        Ok(p) => p,
                        Err(e) => {
                            warn!(error = %e, "Unreadable relay payload");
                            continue;
                        }
                    };
                    self.forward(msg.get_channel_name(), &payload).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Realtime relay stopped");
        Ok(())
    }

    async fn forward(&self, channel: &str, payload: &str) {
        match decode(channel, payload) {
            Ok((topic, event)) => {
                debug!(topic = %topic, event = %event.event, "Relaying realtime event");
                if let Err(e) = self.local.publish(topic, event).await {
                    warn!(topic = %topic, error = %e, "Local realtime publish failed");
                }
            }
            Err(e) => warn!(channel, error = %e, "Dropping undecodable relay message"),
        }
    }
}

fn decode(channel: &str, payload: &str) -> Result<(Topic, RealtimeEvent), DomainError> {
    let topic = channel
        .strip_prefix(CHANNEL_PREFIX)
        .ok_or_else(|| DomainError::validation("channel", "missing realtime prefix"))?
        .parse()?;
    let event = serde_json::from_str(payload)?;
    Ok((topic, event))
}
