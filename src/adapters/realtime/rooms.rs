//! In-process topic rooms for real-time fan-out.
//!
//! Each topic owns a `broadcast` channel. A connected client joins its own
//! `user:<id>` topic, the broadcast topic, and the threads it is viewing;
//! every event published to a topic reaches all receivers currently joined.
//!
//! ```text
//! user:42       thread:7        broadcast
//! └── client-a  ├── client-a    ├── client-a
//!               └── client-b    └── client-b
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::domain::foundation::DomainError;
use crate::ports::{RealtimeEvent, RealtimePublisher, Topic};

/// Identifies one socket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of topic channels.
///
/// Uses `RwLock` since publishes (reads) vastly outnumber joins and leaves.
pub struct TopicRooms {
    rooms: RwLock<HashMap<Topic, broadcast::Sender<RealtimeEvent>>>,
    /// Topics each client joined, for cleanup on disconnect.
    client_topics: RwLock<HashMap<ClientId, Vec<Topic>>>,
    channel_capacity: usize,
}

impl TopicRooms {
    /// `channel_capacity` bounds each topic's buffer; slow receivers lag
    /// and miss the oldest events.
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            client_topics: RwLock::new(HashMap::new()),
            channel_capacity,
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(128)
    }

    /// Joins `client_id` to `topic`, creating the room on first use.
    pub async fn join(&self, topic: Topic, client_id: ClientId) -> broadcast::Receiver<RealtimeEvent> {
        let mut rooms = self.rooms.write().await;
        let sender = rooms.entry(topic).or_insert_with(|| {
            let (tx, _) = broadcast::channel(self.channel_capacity);
            tx
        });

        let mut client_topics = self.client_topics.write().await;
        let topics = client_topics.entry(client_id).or_default();
        if !topics.contains(&topic) {
            topics.push(topic);
        }

        sender.subscribe()
    }

    /// Forgets the client. Rooms left without receivers are dropped.
    ///
    /// The client's receivers must already be dropped for its rooms to count
    /// as empty.
    pub async fn leave(&self, client_id: &ClientId) {
        let Some(topics) = self.client_topics.write().await.remove(client_id) else {
            return;
        };
        let mut rooms = self.rooms.write().await;
        for topic in topics {
            if rooms.get(&topic).map_or(false, |s| s.receiver_count() == 0) {
                rooms.remove(&topic);
            }
        }
    }

    pub async fn client_count(&self, topic: &Topic) -> usize {
        self.rooms
            .read()
            .await
            .get(topic)
            .map_or(0, |s| s.receiver_count())
    }

    pub async fn active_topics(&self) -> Vec<Topic> {
        self.rooms.read().await.keys().copied().collect()
    }
}

impl Default for TopicRooms {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl RealtimePublisher for TopicRooms {
    async fn publish(&self, topic: Topic, event: RealtimeEvent) -> Result<(), DomainError> {
        let rooms = self.rooms.read().await;
        if let Some(sender) = rooms.get(&topic) {
            // No receivers is fine.
            let _ = sender.send(event);
        }
        Ok(())
    }
}
