//! ReviewTicketRepository port - Persistence for moderation tickets.

use async_trait::async_trait;

use crate::domain::foundation::{ContentId, DomainError, TicketId};
use crate::domain::moderation::ReviewTicket;

#[async_trait]
pub trait ReviewTicketRepository: Send + Sync {
    async fn insert(&self, ticket: &ReviewTicket) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<ReviewTicket>, DomainError>;

    /// Persists status, resolution and `updated_at`.
    async fn update(&self, ticket: &ReviewTicket) -> Result<(), DomainError>;

    async fn find_by_content(&self, content_id: &ContentId) -> Result<Vec<ReviewTicket>, DomainError>;
}
