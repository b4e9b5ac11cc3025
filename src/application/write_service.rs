//! ForumWriteService - producer side of the pipeline.
//!
//! Every write follows the same order: store write, synchronous cache
//! invalidation, then job and real-time publication. Moderation enqueue
//! failures are returned to the caller; notification enqueues and real-time
//! pushes are best-effort and only logged.

use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::handlers::moderation_job_for;
use super::thread_cache::ThreadCache;
use crate::domain::content::{extract_mentions, ContentItem, LifecycleStatus};
use crate::domain::foundation::{ContentId, DomainError, ErrorCode, MessageId, ThreadId, UserId};
use crate::domain::jobs::{NotificationJob, QueueName, SummaryJob};
use crate::domain::thread::Thread;
use crate::ports::{
    publish_job, ContentRepository, JobQueue, RealtimeEvent, RealtimePublisher, ThreadRepository,
    Topic, UserDirectory, POST_CREATED, THREAD_CREATED, THREAD_DELETED, THREAD_UPDATED,
};

/// Start a thread with its opening post.
#[derive(Debug, Clone)]
pub struct CreateThreadCommand {
    pub author_id: UserId,
    pub title: String,
    pub category: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct UpdateThreadCommand {
    pub thread_id: ThreadId,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct SubmitPostCommand {
    pub thread_id: ThreadId,
    pub author_id: UserId,
    /// Post being replied to, if any.
    pub parent_id: Option<ContentId>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct EditPostCommand {
    pub content_id: ContentId,
    pub body: String,
}

pub struct ForumWriteService {
    threads: Arc<dyn ThreadRepository>,
    contents: Arc<dyn ContentRepository>,
    users: Arc<dyn UserDirectory>,
    queue: Arc<dyn JobQueue>,
    realtime: Arc<dyn RealtimePublisher>,
    cache: Arc<ThreadCache>,
}

impl ForumWriteService {
    pub fn new(
        threads: Arc<dyn ThreadRepository>,
        contents: Arc<dyn ContentRepository>,
        users: Arc<dyn UserDirectory>,
        queue: Arc<dyn JobQueue>,
        realtime: Arc<dyn RealtimePublisher>,
        cache: Arc<ThreadCache>,
    ) -> Self {
        Self {
            threads,
            contents,
            users,
            queue,
            realtime,
            cache,
        }
    }

    pub async fn create_thread(
        &self,
        cmd: CreateThreadCommand,
    ) -> Result<(Thread, ContentItem), DomainError> {
        let mut thread = Thread::new(cmd.author_id, cmd.title, cmd.category)?;
        let opening = ContentItem::submit(thread.id, cmd.author_id, None, cmd.body)?;

        // 1. Store
        self.threads.insert(&thread).await?;
        self.contents.insert(&opening).await?;
        self.threads.adjust_post_count(&thread.id, 1).await?;
        thread.post_count += 1;

        // 2. Invalidate
        self.cache.invalidate_lists().await;

        // 3. Publish
        publish_job(self.queue.as_ref(), QueueName::Moderation, &moderation_job_for(&opening))
            .await?;
        self.push(Topic::Broadcast, THREAD_CREATED, json!(thread)).await;

        info!(thread_id = %thread.id, content_id = %opening.id, "Thread created");
        Ok((thread, opening))
    }

    pub async fn update_thread(&self, cmd: UpdateThreadCommand) -> Result<Thread, DomainError> {
        let mut thread = self.active_thread(&cmd.thread_id).await?;
        thread.rename(cmd.title)?;

        self.threads.update(&thread).await?;
        self.cache.invalidate_thread(&thread).await;

        let payload = json!(thread);
        self.push(Topic::Broadcast, THREAD_UPDATED, payload.clone()).await;
        self.push(Topic::Thread(thread.id), THREAD_UPDATED, payload).await;
        Ok(thread)
    }

    pub async fn delete_thread(&self, thread_id: &ThreadId) -> Result<(), DomainError> {
        let thread = self.active_thread(thread_id).await?;

        self.threads.soft_delete(thread_id).await?;
        self.cache.invalidate_thread(&thread).await;

        let payload = json!({ "threadId": thread_id });
        self.push(Topic::Broadcast, THREAD_DELETED, payload.clone()).await;
        self.push(Topic::Thread(*thread_id), THREAD_DELETED, payload).await;
        info!(thread_id = %thread_id, "Thread deleted");
        Ok(())
    }

    pub async fn submit_post(&self, cmd: SubmitPostCommand) -> Result<ContentItem, DomainError> {
        let thread = self.active_thread(&cmd.thread_id).await?;
        let parent = match &cmd.parent_id {
            Some(id) => Some(
                self.contents
                    .find_by_id(id)
                    .await?
                    .filter(|p| p.thread_id == thread.id)
                    .ok_or_else(|| content_not_found(id))?,
            ),
            None => None,
        };
        let post = ContentItem::submit(thread.id, cmd.author_id, cmd.parent_id, cmd.body)?;

        // 1. Store
        self.contents.insert(&post).await?;
        self.threads.adjust_post_count(&thread.id, 1).await?;

        // 2. Invalidate
        self.cache.invalidate_thread(&thread).await;

        // 3. Publish
        publish_job(self.queue.as_ref(), QueueName::Moderation, &moderation_job_for(&post))
            .await?;
        for job in self.notifications_for(&thread, parent.as_ref(), &post).await {
            if let Err(e) = publish_job(self.queue.as_ref(), QueueName::Notifications, &job).await {
                warn!(
                    content_id = %post.id,
                    kind = %job.kind(),
                    error = %e,
                    "Failed to enqueue notification"
                );
            }
        }
        self.push(Topic::Thread(thread.id), POST_CREATED, json!(post)).await;

        info!(content_id = %post.id, thread_id = %thread.id, "Post submitted");
        Ok(post)
    }

    /// Replaces the body and sends the post back through moderation.
    pub async fn edit_post(&self, cmd: EditPostCommand) -> Result<ContentItem, DomainError> {
        let mut post = self
            .contents
            .find_by_id(&cmd.content_id)
            .await?
            .filter(|p| p.lifecycle == LifecycleStatus::Active)
            .ok_or_else(|| content_not_found(&cmd.content_id))?;
        post.edit(cmd.body)?;

        self.contents.update_body(&post).await?;
        self.invalidate_thread_of(&post.thread_id).await?;
        publish_job(self.queue.as_ref(), QueueName::Moderation, &moderation_job_for(&post))
            .await?;
        Ok(post)
    }

    pub async fn delete_post(&self, content_id: &ContentId) -> Result<(), DomainError> {
        let post = self
            .contents
            .find_by_id(content_id)
            .await?
            .filter(|p| p.lifecycle == LifecycleStatus::Active)
            .ok_or_else(|| content_not_found(content_id))?;

        self.contents.mark_deleted(content_id).await?;
        self.threads.adjust_post_count(&post.thread_id, -1).await?;
        self.invalidate_thread_of(&post.thread_id).await?;
        Ok(())
    }

    /// Queues summary regeneration. The result lands in the cache only.
    pub async fn request_summary(&self, thread_id: &ThreadId) -> Result<MessageId, DomainError> {
        self.active_thread(thread_id).await?;
        publish_job(
            self.queue.as_ref(),
            QueueName::Summary,
            &SummaryJob {
                thread_id: *thread_id,
            },
        )
        .await
    }

    async fn notifications_for(
        &self,
        thread: &Thread,
        parent: Option<&ContentItem>,
        post: &ContentItem,
    ) -> Vec<NotificationJob> {
        let poster = post.author_id;
        let mut jobs = Vec::new();

        if thread.author_id != poster {
            jobs.push(NotificationJob::ContentCreated {
                target_user_id: thread.author_id,
                thread_id: thread.id,
                content_id: post.id,
            });
        }
        if let Some(parent) = parent.filter(|p| p.author_id != poster) {
            jobs.push(NotificationJob::Reply {
                target_user_id: parent.author_id,
                actor_id: poster,
                thread_id: thread.id,
                content_id: post.id,
            });
        }

        let names = extract_mentions(&post.body);
        if !names.is_empty() {
            match self.users.find_by_usernames(&names).await {
                Ok(ids) => jobs.extend(ids.into_iter().filter(|id| *id != poster).map(|id| {
                    NotificationJob::Mention {
                        target_user_id: id,
                        actor_id: poster,
                        thread_id: thread.id,
                        content_id: post.id,
                    }
                })),
                Err(e) => warn!(content_id = %post.id, error = %e, "Mention lookup failed"),
            }
        }
        jobs
    }

    async fn active_thread(&self, id: &ThreadId) -> Result<Thread, DomainError> {
        self.threads
            .find_by_id(id)
            .await?
            .filter(Thread::is_active)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::ThreadNotFound, "Thread not found")
                    .with_detail("thread_id", id.to_string())
            })
    }

    async fn invalidate_thread_of(&self, id: &ThreadId) -> Result<(), DomainError> {
        match self.threads.find_by_id(id).await? {
            Some(thread) => self.cache.invalidate_thread(&thread).await,
            None => self.cache.invalidate_lists().await,
        }
        Ok(())
    }

    async fn push(&self, topic: Topic, event: &str, payload: serde_json::Value) {
        if let Err(e) = self.realtime.publish(topic, RealtimeEvent::new(event, payload)).await {
            warn!(topic = %topic, event, error = %e, "Real-time push failed");
        }
    }
}

fn content_not_found(id: &ContentId) -> DomainError {
    DomainError::new(ErrorCode::ContentNotFound, "Content not found")
        .with_detail("content_id", id.to_string())
}
