//! RetentionSweeper - periodic removal of expired notifications.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::NotificationRepository;

pub struct RetentionSweeper {
    notifications: Arc<dyn NotificationRepository>,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(notifications: Arc<dyn NotificationRepository>, interval: Duration) -> Self {
        Self {
            notifications,
            interval,
        }
    }

    /// Deletes every notification past its expiry. Returns how many went.
    pub async fn sweep_once(&self) -> Result<u64, DomainError> {
        let removed = self.notifications.delete_expired(Timestamp::now()).await?;
        if removed > 0 {
            info!(removed, "Expired notifications removed");
        } else {
            debug!("No expired notifications");
        }
        Ok(removed)
    }

    /// Sweeps every `interval` until shutdown is signalled.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "Retention sweeper started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        warn!(error = %e, "Retention sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Retention sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryNotificationRepository;
    use crate::domain::foundation::UserId;
    use crate::domain::jobs::NotificationJob;
    use crate::domain::notification::{Notification, NotificationContext};

    fn notification() -> Notification {
        Notification::compose(
            &NotificationJob::System {
                target_user_id: UserId::new(),
                title: "Maintenance".into(),
                message: "Tonight".into(),
                link: None,
            },
            &NotificationContext::default(),
        )
    }

    #[tokio::test]
    async fn sweep_removes_only_expired() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let mut old = notification();
        old.expires_at = Timestamp::now().minus_days(1);
        repo.insert(&old).await.unwrap();
        repo.insert(&notification()).await.unwrap();

        let sweeper = RetentionSweeper::new(repo.clone(), Duration::from_secs(3600));

        assert_eq!(sweeper.sweep_once().await.unwrap(), 1);
        assert_eq!(repo.len().await, 1);
        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn run_exits_on_shutdown() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let sweeper = RetentionSweeper::new(repo, Duration::from_millis(5));
        let (tx, rx) = watch::channel(false);

        let task = tokio::spawn(sweeper.run(rx));
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}
