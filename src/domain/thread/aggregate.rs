//! Thread aggregate as read and written by the pipeline.

use serde::{Deserialize, Serialize};

use crate::domain::content::LifecycleStatus;
use crate::domain::foundation::{ThreadId, Timestamp, UserId, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: ThreadId,
    pub slug: String,
    pub title: String,
    pub author_id: UserId,
    pub category: Option<String>,
    pub post_count: i64,
    pub lifecycle: LifecycleStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Thread {
    pub fn new(
        author_id: UserId,
        title: impl Into<String>,
        category: Option<String>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title"));
        }
        let id = ThreadId::new();
        let now = Timestamp::now();
        Ok(Self {
            slug: slugify(&title, &id),
            id,
            title,
            author_id,
            category,
            post_count: 0,
            lifecycle: LifecycleStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn rename(&mut self, title: impl Into<String>) -> Result<(), ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title"));
        }
        self.title = title;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == LifecycleStatus::Active
    }
}

/// Lowercase, hyphen-separated title with a short id suffix for uniqueness.
fn slugify(title: &str, id: &ThreadId) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    let suffix: String = id.to_string().chars().take(8).collect();
    if slug.is_empty() {
        suffix
    } else {
        format!("{}-{}", slug, suffix)
    }
}

/// Cached output of the summary worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub thread_id: ThreadId,
    pub summary: String,
    pub key_points: Vec<String>,
    pub word_count: usize,
    pub sentiment_score: f64,
    pub generated_at: Timestamp,
}

/// Parameters of a thread listing; its hash names the cached page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadListQuery {
    pub page: u32,
    pub limit: u32,
    pub category: Option<String>,
    pub sort: ThreadSort,
}

impl Default for ThreadListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            category: None,
            sort: ThreadSort::Newest,
        }
    }
}

impl ThreadListQuery {
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.limit as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadSort {
    Newest,
    Active,
    Popular,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_lowercase_and_hyphenated() {
        let thread = Thread::new(UserId::new(), "Hello,  Rust World!", None).unwrap();
        assert!(thread.slug.starts_with("hello-rust-world-"));
        assert_eq!(thread.slug.len(), "hello-rust-world-".len() + 8);
    }

    #[test]
    fn slug_of_symbol_title_is_id_prefix() {
        let thread = Thread::new(UserId::new(), "???", None).unwrap();
        assert_eq!(thread.slug.len(), 8);
    }

    #[test]
    fn blank_title_is_rejected() {
        assert!(Thread::new(UserId::new(), " ", None).is_err());
    }

    #[test]
    fn list_query_offset_is_zero_based() {
        let query = ThreadListQuery { page: 3, limit: 10, ..Default::default() };
        assert_eq!(query.offset(), 20);
        let first = ThreadListQuery { page: 0, ..Default::default() };
        assert_eq!(first.offset(), 0);
    }
}
