//! PostgreSQL webhook subscriptions and delivery log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp};
use crate::domain::webhook::{DeliveryLogFilter, WebhookDeliveryLog, WebhookSubscription};
use crate::ports::{DeliveryLogRepository, WebhookSubscriptionRepository};

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    url: String,
    method: String,
    headers: Value,
    events: Vec<String>,
    secret: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for WebhookSubscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let headers: BTreeMap<String, String> = serde_json::from_value(row.headers)?;
        Ok(WebhookSubscription {
            id: SubscriptionId::from_uuid(row.id),
            url: row.url,
            method: row.method.parse()?,
            headers,
            events: row.events,
            secret: row.secret.map(Secret::new),
            is_active: row.is_active,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Clone)]
pub struct PostgresWebhookSubscriptionRepository {
    pool: PgPool,
}

impl PostgresWebhookSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookSubscriptionRepository for PostgresWebhookSubscriptionRepository {
    async fn insert(&self, s: &WebhookSubscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_subscriptions (
                id, url, method, headers, events, secret, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(s.id.as_uuid())
        .bind(&s.url)
        .bind(s.method.as_str())
        .bind(serde_json::to_value(&s.headers)?)
        .bind(&s.events)
        .bind(s.secret.as_ref().map(|k| k.expose_secret().clone()))
        .bind(s.is_active)
        .bind(s.created_at.as_datetime())
        .bind(s.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert subscription: {}", e)))?;
        Ok(())
    }

    async fn find_active_for_event(&self, event: &str) -> Result<Vec<WebhookSubscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(
            "SELECT * FROM webhook_subscriptions WHERE is_active = TRUE AND $1 = ANY(events)",
        )
        .bind(event)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list subscriptions: {}", e)))?;
        rows.into_iter().map(WebhookSubscription::try_from).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LogRow {
    event: String,
    payload: Value,
    source: String,
    status: String,
    error: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LogRow> for WebhookDeliveryLog {
    type Error = DomainError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        Ok(WebhookDeliveryLog {
            event: row.event,
            payload: row.payload,
            source: row.source.parse()?,
            status: row.status.parse()?,
            error: row.error,
            timestamp: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[derive(Clone)]
pub struct PostgresDeliveryLog {
    pool: PgPool,
}

impl PostgresDeliveryLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryLogRepository for PostgresDeliveryLog {
    async fn append(&self, entry: &WebhookDeliveryLog) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO webhook_delivery_logs (event, payload, source, status, error, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&entry.event)
        .bind(&entry.payload)
        .bind(entry.source.as_str())
        .bind(entry.status.as_str())
        .bind(&entry.error)
        .bind(entry.timestamp.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to append delivery log: {}", e)))?;
        Ok(())
    }

    async fn query(&self, filter: &DeliveryLogFilter) -> Result<Vec<WebhookDeliveryLog>, DomainError> {
        let rows: Vec<LogRow> = sqlx::query_as(
            r#"
            SELECT event, payload, source, status, error, created_at
            FROM webhook_delivery_logs
            WHERE ($1::text IS NULL OR event = $1)
              AND ($2::text IS NULL OR source = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            "#,
        )
        .bind(&filter.event)
        .bind(filter.source.map(|s| s.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.effective_limit() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to query delivery log: {}", e)))?;
        rows.into_iter().map(WebhookDeliveryLog::try_from).collect()
    }
}
