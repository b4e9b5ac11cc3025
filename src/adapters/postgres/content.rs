//! PostgreSQL implementations of ContentRepository and ThreadRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::content::{ContentItem, ModerationUpdate, ScoreSnapshot};
use crate::domain::foundation::{
    ContentId, DomainError, ErrorCode, ThreadId, Timestamp, UserId,
};
use crate::domain::thread::{Thread, ThreadListQuery, ThreadSort};
use crate::ports::{ContentRepository, ThreadRepository};

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("Failed to {}: {}", action, e))
}

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    thread_id: Uuid,
    author_id: Uuid,
    parent_id: Option<Uuid>,
    body: String,
    moderation_status: String,
    spam_score: Option<f64>,
    toxicity_score: Option<f64>,
    inappropriate_score: Option<f64>,
    score_reasoning: Option<String>,
    recommendation: Option<String>,
    lifecycle: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for ContentItem {
    type Error = DomainError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let score_snapshot = match (row.spam_score, row.toxicity_score, row.inappropriate_score) {
            (Some(s), Some(t), Some(i)) => Some(ScoreSnapshot::new(s, t, i)?),
            _ => None,
        };
        Ok(ContentItem {
            id: ContentId::from_uuid(row.id),
            thread_id: ThreadId::from_uuid(row.thread_id),
            author_id: UserId::from_uuid(row.author_id),
            parent_id: row.parent_id.map(ContentId::from_uuid),
            body: row.body,
            moderation_status: row.moderation_status.parse()?,
            score_snapshot,
            score_reasoning: row.score_reasoning,
            recommendation: row.recommendation.as_deref().map(str::parse).transpose()?,
            lifecycle: row.lifecycle.parse()?,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const POST_COLUMNS: &str = "id, thread_id, author_id, parent_id, body, moderation_status, \
     spam_score, toxicity_score, inappropriate_score, score_reasoning, recommendation, \
     lifecycle, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresContentRepository {
    pool: PgPool,
}

impl PostgresContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepository for PostgresContentRepository {
    async fn insert(&self, item: &ContentItem) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO posts (
                id, thread_id, author_id, parent_id, body, moderation_status,
                lifecycle, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.thread_id.as_uuid())
        .bind(item.author_id.as_uuid())
        .bind(item.parent_id.map(|p| *p.as_uuid()))
        .bind(&item.body)
        .bind(item.moderation_status.as_str())
        .bind(item.lifecycle.as_str())
        .bind(item.created_at.as_datetime())
        .bind(item.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert post", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &ContentId) -> Result<Option<ContentItem>, DomainError> {
        let row: Option<PostRow> =
            sqlx::query_as(&format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("fetch post", e))?;
        row.map(ContentItem::try_from).transpose()
    }

    async fn update_body(&self, item: &ContentItem) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE posts SET body = $1, moderation_status = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(&item.body)
        .bind(item.moderation_status.as_str())
        .bind(item.updated_at.as_datetime())
        .bind(item.id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update post body", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::ContentNotFound, "content not found")
                .with_detail("content_id", item.id.to_string()));
        }
        Ok(())
    }

    async fn save_moderation(&self, update: &ModerationUpdate) -> Result<bool, DomainError> {
        // Single statement: scores, status and lifecycle land together.
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET spam_score = $1,
                toxicity_score = $2,
                inappropriate_score = $3,
                score_reasoning = $4,
                recommendation = $5,
                moderation_status = $6,
                lifecycle = COALESCE($7, lifecycle),
                updated_at = NOW()
            WHERE id = $8
            "#,
        )
        .bind(update.scores.spam_score())
        .bind(update.scores.toxicity_score())
        .bind(update.scores.inappropriate_score())
        .bind(&update.reasoning)
        .bind(update.recommendation.as_str())
        .bind(update.status.as_str())
        .bind(update.lifecycle.map(|l| l.as_str()))
        .bind(update.content_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save moderation result", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_deleted(&self, id: &ContentId) -> Result<(), DomainError> {
        sqlx::query("UPDATE posts SET lifecycle = 'deleted', updated_at = NOW() WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete post", e))?;
        Ok(())
    }

    async fn list_visible_for_thread(
        &self,
        thread_id: &ThreadId,
        limit: usize,
    ) -> Result<Vec<ContentItem>, DomainError> {
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            "SELECT {} FROM posts \
             WHERE thread_id = $1 AND lifecycle = 'active' AND moderation_status <> 'rejected' \
             ORDER BY created_at ASC LIMIT $2",
            POST_COLUMNS
        ))
        .bind(thread_id.as_uuid())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list thread posts", e))?;
        rows.into_iter().map(ContentItem::try_from).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ThreadRow {
    id: Uuid,
    slug: String,
    title: String,
    author_id: Uuid,
    category: Option<String>,
    post_count: i64,
    lifecycle: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ThreadRow> for Thread {
    type Error = DomainError;

    fn try_from(row: ThreadRow) -> Result<Self, Self::Error> {
        Ok(Thread {
            id: ThreadId::from_uuid(row.id),
            slug: row.slug,
            title: row.title,
            author_id: UserId::from_uuid(row.author_id),
            category: row.category,
            post_count: row.post_count,
            lifecycle: row.lifecycle.parse()?,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const THREAD_COLUMNS: &str =
    "id, slug, title, author_id, category, post_count, lifecycle, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresThreadRepository {
    pool: PgPool,
}

impl PostgresThreadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn order_clause(sort: ThreadSort) -> &'static str {
    match sort {
        ThreadSort::Newest => "created_at DESC",
        ThreadSort::Active => "updated_at DESC",
        ThreadSort::Popular => "post_count DESC, created_at DESC",
    }
}

#[async_trait]
impl ThreadRepository for PostgresThreadRepository {
    async fn insert(&self, thread: &Thread) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO threads (
                id, slug, title, author_id, category, post_count, lifecycle, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(thread.id.as_uuid())
        .bind(&thread.slug)
        .bind(&thread.title)
        .bind(thread.author_id.as_uuid())
        .bind(&thread.category)
        .bind(thread.post_count)
        .bind(thread.lifecycle.as_str())
        .bind(thread.created_at.as_datetime())
        .bind(thread.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert thread", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &ThreadId) -> Result<Option<Thread>, DomainError> {
        let row: Option<ThreadRow> =
            sqlx::query_as(&format!("SELECT {} FROM threads WHERE id = $1", THREAD_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("fetch thread", e))?;
        row.map(Thread::try_from).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Thread>, DomainError> {
        let row: Option<ThreadRow> =
            sqlx::query_as(&format!("SELECT {} FROM threads WHERE slug = $1", THREAD_COLUMNS))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("fetch thread by slug", e))?;
        row.map(Thread::try_from).transpose()
    }

    async fn list(&self, query: &ThreadListQuery) -> Result<Vec<Thread>, DomainError> {
        let sql = format!(
            "SELECT {} FROM threads \
             WHERE lifecycle = 'active' AND ($1::text IS NULL OR category = $1) \
             ORDER BY {} LIMIT $2 OFFSET $3",
            THREAD_COLUMNS,
            order_clause(query.sort)
        );
        let rows: Vec<ThreadRow> = sqlx::query_as(&sql)
            .bind(&query.category)
            .bind(query.limit as i64)
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list threads", e))?;
        rows.into_iter().map(Thread::try_from).collect()
    }

    async fn update(&self, thread: &Thread) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE threads SET title = $1, category = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(&thread.title)
        .bind(&thread.category)
        .bind(thread.updated_at.as_datetime())
        .bind(thread.id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update thread", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::ThreadNotFound, "thread not found")
                .with_detail("thread_id", thread.id.to_string()));
        }
        Ok(())
    }

    async fn soft_delete(&self, id: &ThreadId) -> Result<(), DomainError> {
        sqlx::query("UPDATE threads SET lifecycle = 'deleted', updated_at = NOW() WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete thread", e))?;
        Ok(())
    }

    async fn adjust_post_count(&self, id: &ThreadId, delta: i64) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE threads SET post_count = GREATEST(post_count + $1, 0), updated_at = NOW() \
             WHERE id = $2",
        )
        .bind(delta)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("adjust post count", e))?;
        Ok(())
    }
}
