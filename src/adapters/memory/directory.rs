//! In-memory user directory.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::UserDirectory;

#[derive(Debug, Clone)]
struct UserEntry {
    username: String,
    display_name: String,
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserEntry>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user and returns the generated id.
    pub async fn add_user(&self, username: &str, display_name: &str) -> UserId {
        let id = UserId::new();
        self.users.write().await.insert(
            id,
            UserEntry {
                username: username.to_string(),
                display_name: display_name.to_string(),
            },
        );
        id
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn display_name(&self, id: &UserId) -> Result<Option<String>, DomainError> {
        Ok(self
            .users
            .read()
            .await
            .get(id)
            .map(|u| u.display_name.clone()))
    }

    async fn find_by_usernames(&self, usernames: &[String]) -> Result<Vec<UserId>, DomainError> {
        let users = self.users.read().await;
        let mut ids: Vec<UserId> = users
            .iter()
            .filter(|(_, u)| usernames.iter().any(|n| n.eq_ignore_ascii_case(&u.username)))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_usernames_case_insensitively() {
        let directory = InMemoryUserDirectory::new();
        let alice = directory.add_user("alice", "Alice A.").await;
        directory.add_user("bob", "Bob").await;

        let found = directory
            .find_by_usernames(&["ALICE".to_string(), "carol".to_string()])
            .await
            .unwrap();
        assert_eq!(found, vec![alice]);
        assert_eq!(
            directory.display_name(&alice).await.unwrap().as_deref(),
            Some("Alice A.")
        );
    }
}
