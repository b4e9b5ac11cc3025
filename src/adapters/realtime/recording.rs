//! Realtime publisher that keeps every event, for assertions in tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{RealtimeEvent, RealtimePublisher, Topic};

#[derive(Debug, Default)]
pub struct RecordingRealtimePublisher {
    events: Mutex<Vec<(Topic, RealtimeEvent)>>,
    unavailable: AtomicBool,
}

impl RecordingRealtimePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<(Topic, RealtimeEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn events_for(&self, topic: &Topic) -> Vec<RealtimeEvent> {
        self.events()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, e)| e)
            .collect()
    }
}

#[async_trait]
impl RealtimePublisher for RecordingRealtimePublisher {
    async fn publish(&self, topic: Topic, event: RealtimeEvent) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::new(ErrorCode::RealtimeError, "realtime channel down"));
        }
        self.events.lock().unwrap().push((topic, event));
        Ok(())
    }
}
