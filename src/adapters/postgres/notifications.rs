//! PostgreSQL notification store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    ContentId, DomainError, NotificationId, ThreadId, Timestamp, UserId,
};
use crate::domain::notification::Notification;
use crate::ports::NotificationRepository;

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    #[sqlx(rename = "type")]
    kind: String,
    title: String,
    message: String,
    link: Option<String>,
    actor_id: Option<Uuid>,
    thread_id: Option<Uuid>,
    content_id: Option<Uuid>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DomainError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: NotificationId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            kind: row.kind.parse()?,
            title: row.title,
            message: row.message,
            link: row.link,
            actor_id: row.actor_id.map(UserId::from_uuid),
            thread_id: row.thread_id.map(ThreadId::from_uuid),
            content_id: row.content_id.map(ContentId::from_uuid),
            is_read: row.is_read,
            read_at: row.read_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            expires_at: Timestamp::from_datetime(row.expires_at),
        })
    }
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("Failed to {}: {}", action, e))
}

#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn insert(&self, n: &Notification) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, user_id, type, title, message, link, actor_id, thread_id, content_id,
                is_read, read_at, created_at, expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(n.id.as_uuid())
        .bind(n.user_id.as_uuid())
        .bind(n.kind.as_str())
        .bind(&n.title)
        .bind(&n.message)
        .bind(&n.link)
        .bind(n.actor_id.map(|a| *a.as_uuid()))
        .bind(n.thread_id.map(|t| *t.as_uuid()))
        .bind(n.content_id.map(|c| *c.as_uuid()))
        .bind(n.is_read)
        .bind(n.read_at.map(|r| *r.as_datetime()))
        .bind(n.created_at.as_datetime())
        .bind(n.expires_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert notification", e))?;
        Ok(())
    }

    async fn find_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
        limit: u32,
    ) -> Result<Vec<Notification>, DomainError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            "SELECT * FROM notifications WHERE user_id = $1 AND (NOT $2 OR is_read = FALSE) \
             ORDER BY created_at DESC LIMIT $3",
        )
        .bind(user_id.as_uuid())
        .bind(unread_only)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list notifications", e))?;
        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn mark_read(&self, id: &NotificationId, user_id: &UserId) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("mark notification read", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW() \
             WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("mark notifications read", e))?;
        Ok(result.rows_affected())
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("count unread notifications", e))?;
        Ok(count.max(0) as u64)
    }

    async fn delete_expired(&self, now: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM notifications WHERE expires_at <= $1")
            .bind(now.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete expired notifications", e))?;
        Ok(result.rows_affected())
    }
}
