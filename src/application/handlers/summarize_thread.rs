//! SummarizeThreadHandler - consumer of the `summary` queue.
//!
//! Summaries live only in the cache; nothing is written to the store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::jobs::{JobError, QueueMessage, SummaryJob};
use crate::domain::notification::UNKNOWN_ACTOR;
use crate::domain::thread::{cache_keys, ThreadSummary};
use crate::ports::{
    set_json, Cache, ContentRepository, ContentScorer, JobHandler, SummaryInput, SummaryPost,
    ThreadRepository, UserDirectory,
};

/// Posts fed to the summarizer, oldest first.
pub const SUMMARY_POST_LIMIT: usize = 100;

pub const DEFAULT_SUMMARY_TTL: Duration = Duration::from_secs(3600);

pub struct SummarizeThreadHandler {
    threads: Arc<dyn ThreadRepository>,
    contents: Arc<dyn ContentRepository>,
    users: Arc<dyn UserDirectory>,
    scorer: Arc<dyn ContentScorer>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl SummarizeThreadHandler {
    pub fn new(
        threads: Arc<dyn ThreadRepository>,
        contents: Arc<dyn ContentRepository>,
        users: Arc<dyn UserDirectory>,
        scorer: Arc<dyn ContentScorer>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            threads,
            contents,
            users,
            scorer,
            cache,
            ttl: DEFAULT_SUMMARY_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns `None` when the thread no longer exists.
    pub async fn summarize(&self, job: &SummaryJob) -> Result<Option<ThreadSummary>, JobError> {
        let Some(thread) = self.threads.find_by_id(&job.thread_id).await? else {
            info!(thread_id = %job.thread_id, "Thread deleted before summary, skipping");
            return Ok(None);
        };

        let items = self
            .contents
            .list_visible_for_thread(&thread.id, SUMMARY_POST_LIMIT)
            .await?;

        let mut names: HashMap<UserId, String> = HashMap::new();
        let mut posts = Vec::with_capacity(items.len());
        for item in items {
            if !names.contains_key(&item.author_id) {
                let name = self
                    .users
                    .display_name(&item.author_id)
                    .await?
                    .unwrap_or_else(|| UNKNOWN_ACTOR.to_string());
                names.insert(item.author_id, name);
            }
            posts.push(SummaryPost {
                author: names[&item.author_id].clone(),
                body: item.body,
            });
        }

        let input = SummaryInput {
            thread_title: thread.title.clone(),
            posts,
        };
        debug!(thread_id = %thread.id, posts = input.posts.len(), "Summarizing thread");
        let output = self.scorer.summarize(&input).await?;

        let summary = ThreadSummary {
            thread_id: thread.id,
            summary: output.summary,
            key_points: output.key_points,
            word_count: input.word_count(),
            sentiment_score: output.sentiment_score,
            generated_at: Timestamp::now(),
        };
        set_json(
            self.cache.as_ref(),
            &cache_keys::thread_summary(&thread.id),
            &summary,
            self.ttl,
        )
        .await?;

        info!(thread_id = %thread.id, words = summary.word_count, "Thread summary cached");
        Ok(Some(summary))
    }
}

#[async_trait]
impl JobHandler for SummarizeThreadHandler {
    fn name(&self) -> &'static str {
        "summarize_thread"
    }

    async fn handle(&self, message: &QueueMessage) -> Result<(), JobError> {
        let job: SummaryJob = message.payload_as()?;
        self.summarize(&job).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemoryCache;
    use crate::adapters::memory::{
        InMemoryContentRepository, InMemoryThreadRepository, InMemoryUserDirectory,
    };
    use crate::adapters::scoring::MockContentScorer;
    use crate::domain::content::{ContentItem, ModerationStatus};
    use crate::domain::foundation::ThreadId;
    use crate::domain::thread::Thread;
    use crate::ports::get_json;

    struct Fixture {
        threads: Arc<InMemoryThreadRepository>,
        contents: Arc<InMemoryContentRepository>,
        users: Arc<InMemoryUserDirectory>,
        scorer: MockContentScorer,
        cache: Arc<InMemoryCache>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                threads: Arc::new(InMemoryThreadRepository::new()),
                contents: Arc::new(InMemoryContentRepository::new()),
                users: Arc::new(InMemoryUserDirectory::new()),
                scorer: MockContentScorer::new(),
                cache: Arc::new(InMemoryCache::new()),
            }
        }

        fn handler(&self) -> SummarizeThreadHandler {
            SummarizeThreadHandler::new(
                self.threads.clone(),
                self.contents.clone(),
                self.users.clone(),
                Arc::new(self.scorer.clone()),
                self.cache.clone(),
            )
        }
    }

    #[tokio::test]
    async fn writes_summary_to_cache_with_ttl() {
        let fx = Fixture::new();
        let alice = fx.users.add_user("alice", "Alice").await;
        let thread = Thread::new(alice, "Rust async", None).unwrap();
        fx.threads.insert(&thread).await.unwrap();
        let first = ContentItem::submit(thread.id, alice, None, "tokio is great").unwrap();
        fx.contents.insert(&first).await.unwrap();
        let mut rejected = ContentItem::submit(thread.id, alice, None, "spam spam").unwrap();
        rejected.moderation_status = ModerationStatus::Rejected;
        fx.contents.insert(&rejected).await.unwrap();

        let summary = fx
            .handler()
            .summarize(&SummaryJob { thread_id: thread.id })
            .await
            .unwrap()
            .unwrap();

        let key = cache_keys::thread_summary(&thread.id);
        let cached: ThreadSummary = get_json(fx.cache.as_ref(), &key).await.unwrap().unwrap();
        assert_eq!(cached, summary);
        assert_eq!(summary.word_count, 3);
        assert!(fx.cache.ttl(&key).await.unwrap() <= DEFAULT_SUMMARY_TTL);

        let inputs = fx.scorer.summary_inputs();
        assert_eq!(inputs[0].posts.len(), 1);
        assert_eq!(inputs[0].posts[0].author, "Alice");
        assert_eq!(inputs[0].thread_title, "Rust async");
    }

    #[tokio::test]
    async fn missing_thread_is_a_no_op() {
        let fx = Fixture::new();
        let result = fx
            .handler()
            .summarize(&SummaryJob { thread_id: ThreadId::new() })
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(fx.scorer.summary_inputs().is_empty());
    }

    #[tokio::test]
    async fn cache_outage_is_transient() {
        let fx = Fixture::new();
        let thread = Thread::new(UserId::new(), "t", None).unwrap();
        fx.threads.insert(&thread).await.unwrap();
        fx.cache.set_unavailable(true);

        let err = fx
            .handler()
            .summarize(&SummaryJob { thread_id: thread.id })
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
