//! UserDirectory port - Read-only lookups of forum members.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Name to show in notifications, `None` if the user is gone.
    async fn display_name(&self, id: &UserId) -> Result<Option<String>, DomainError>;

    /// Ids of the members with the given usernames. Unknown names are skipped.
    async fn find_by_usernames(&self, usernames: &[String]) -> Result<Vec<UserId>, DomainError>;
}
