//! PostgreSQL review ticket store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    ContentId, DomainError, ErrorCode, TicketId, Timestamp, UserId, ValidationError,
};
use crate::domain::moderation::{ReportTarget, ReviewTicket};
use crate::ports::ReviewTicketRepository;

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    target_kind: String,
    target_id: Uuid,
    reporter_id: Option<Uuid>,
    category: String,
    description: String,
    status: String,
    resolution: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn target_parts(target: &ReportTarget) -> (&'static str, Uuid) {
    match target {
        ReportTarget::Content(id) => ("content", *id.as_uuid()),
        ReportTarget::User(id) => ("user", *id.as_uuid()),
    }
}

impl TryFrom<TicketRow> for ReviewTicket {
    type Error = DomainError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let target = match row.target_kind.as_str() {
            "content" => ReportTarget::Content(ContentId::from_uuid(row.target_id)),
            "user" => ReportTarget::User(UserId::from_uuid(row.target_id)),
            other => {
                return Err(ValidationError::invalid_format(
                    "target_kind",
                    format!("unknown target '{}'", other),
                )
                .into())
            }
        };
        Ok(ReviewTicket {
            id: TicketId::from_uuid(row.id),
            target,
            reporter_id: row.reporter_id.map(UserId::from_uuid),
            category: row.category.parse()?,
            description: row.description,
            status: row.status.parse()?,
            resolution: row.resolution.as_deref().map(str::parse).transpose()?,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Clone)]
pub struct PostgresReviewTicketRepository {
    pool: PgPool,
}

impl PostgresReviewTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewTicketRepository for PostgresReviewTicketRepository {
    async fn insert(&self, ticket: &ReviewTicket) -> Result<(), DomainError> {
        let (kind, target_id) = target_parts(&ticket.target);
        sqlx::query(
            r#"
            INSERT INTO review_tickets (
                id, target_kind, target_id, reporter_id, category, description,
                status, resolution, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(ticket.id.as_uuid())
        .bind(kind)
        .bind(target_id)
        .bind(ticket.reporter_id.map(|r| *r.as_uuid()))
        .bind(ticket.category.as_str())
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.resolution.map(|r| r.as_str()))
        .bind(ticket.created_at.as_datetime())
        .bind(ticket.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert ticket: {}", e)))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<ReviewTicket>, DomainError> {
        let row: Option<TicketRow> = sqlx::query_as("SELECT * FROM review_tickets WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to fetch ticket: {}", e)))?;
        row.map(ReviewTicket::try_from).transpose()
    }

    async fn update(&self, ticket: &ReviewTicket) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE review_tickets SET status = $1, resolution = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(ticket.status.as_str())
        .bind(ticket.resolution.map(|r| r.as_str()))
        .bind(ticket.updated_at.as_datetime())
        .bind(ticket.id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update ticket: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::TicketNotFound, "ticket not found")
                .with_detail("ticket_id", ticket.id.to_string()));
        }
        Ok(())
    }

    async fn find_by_content(&self, content_id: &ContentId) -> Result<Vec<ReviewTicket>, DomainError> {
        let rows: Vec<TicketRow> = sqlx::query_as(
            "SELECT * FROM review_tickets WHERE target_kind = 'content' AND target_id = $1 \
             ORDER BY created_at ASC",
        )
        .bind(content_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list tickets: {}", e)))?;
        rows.into_iter().map(ReviewTicket::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_maps_content_target() {
        let content = Uuid::new_v4();
        let now = Utc::now();
        let ticket = ReviewTicket::try_from(TicketRow {
            id: Uuid::new_v4(),
            target_kind: "content".into(),
            target_id: content,
            reporter_id: None,
            category: "spam".into(),
            description: "AI Moderation: spam".into(),
            status: "reviewing".into(),
            resolution: None,
            created_at: now,
            updated_at: now,
        })
        .unwrap();
        assert_eq!(ticket.target, ReportTarget::Content(ContentId::from_uuid(content)));
        assert_eq!(target_parts(&ticket.target), ("content", content));
    }
}
