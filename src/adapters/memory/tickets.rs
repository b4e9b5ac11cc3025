//! In-memory review ticket store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{ContentId, DomainError, ErrorCode, TicketId};
use crate::domain::moderation::{ReportTarget, ReviewTicket};
use crate::ports::ReviewTicketRepository;

#[derive(Default)]
pub struct InMemoryReviewTicketRepository {
    tickets: RwLock<HashMap<TicketId, ReviewTicket>>,
}

impl InMemoryReviewTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<ReviewTicket> {
        let mut tickets: Vec<ReviewTicket> = self.tickets.read().await.values().cloned().collect();
        tickets.sort_by_key(|t| t.created_at);
        tickets
    }
}

#[async_trait]
impl ReviewTicketRepository for InMemoryReviewTicketRepository {
    async fn insert(&self, ticket: &ReviewTicket) -> Result<(), DomainError> {
        self.tickets.write().await.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<ReviewTicket>, DomainError> {
        Ok(self.tickets.read().await.get(id).cloned())
    }

    async fn update(&self, ticket: &ReviewTicket) -> Result<(), DomainError> {
        let mut tickets = self.tickets.write().await;
        match tickets.get_mut(&ticket.id) {
            Some(stored) => {
                *stored = ticket.clone();
                Ok(())
            }
            None => Err(DomainError::new(ErrorCode::TicketNotFound, "ticket not found")
                .with_detail("ticket_id", ticket.id.to_string())),
        }
    }

    async fn find_by_content(&self, content_id: &ContentId) -> Result<Vec<ReviewTicket>, DomainError> {
        let mut found: Vec<ReviewTicket> = self
            .tickets
            .read()
            .await
            .values()
            .filter(|t| t.target == ReportTarget::Content(*content_id))
            .cloned()
            .collect();
        found.sort_by_key(|t| t.created_at);
        Ok(found)
    }
}
