//! PostgreSQL user directory.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::UserDirectory;

#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn display_name(&self, id: &UserId) -> Result<Option<String>, DomainError> {
        let name: Option<(String,)> = sqlx::query_as("SELECT display_name FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to fetch user: {}", e)))?;
        Ok(name.map(|(n,)| n))
    }

    async fn find_by_usernames(&self, usernames: &[String]) -> Result<Vec<UserId>, DomainError> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        let lowered: Vec<String> = usernames.iter().map(|u| u.to_lowercase()).collect();
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE LOWER(username) = ANY($1) ORDER BY id")
                .bind(&lowered)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to resolve usernames: {}", e)))?;
        Ok(rows.into_iter().map(|(id,)| UserId::from_uuid(id)).collect())
    }
}
