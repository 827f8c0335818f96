//! Outbox drain loop. State mutations only enqueue rows; this worker owns
//! delivery and its retry policy, so a provider outage can never fail or
//! roll back the state change that produced the notification.

use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::db::Store;

use super::sender::NotificationSender;

const POLL_INTERVAL: Duration = Duration::from_secs(30);
const BATCH_SIZE: i64 = 20;
const MAX_ATTEMPTS: i32 = 8;
const BASE_BACKOFF_SECS: i64 = 30;
const MAX_BACKOFF_SECS: i64 = 3600;

pub fn spawn_outbox_worker(
    store: Arc<dyn Store>,
    sender: Arc<dyn NotificationSender>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        loop {
            interval.tick().await;
            match drain_once(store.as_ref(), sender.as_ref()).await {
                Ok(0) => {}
                Ok(sent) => debug!(sent, "outbox drained"),
                Err(err) => warn!(error = %err, "outbox drain failed"),
            }
        }
    })
}

/// Send one batch of due notifications; returns how many were delivered.
pub async fn drain_once(
    store: &dyn Store,
    sender: &dyn NotificationSender,
) -> anyhow::Result<usize> {
    let due = store.due_notifications(BATCH_SIZE).await?;
    let mut sent = 0;

    for notification in due {
        match sender.send(&notification).await {
            Ok(()) => {
                store.mark_notification_sent(notification.id).await?;
                sent += 1;
            }
            Err(err) => {
                let attempts = notification.attempts + 1;
                let give_up = attempts >= MAX_ATTEMPTS;
                let backoff = (BASE_BACKOFF_SECS << attempts.min(12)).min(MAX_BACKOFF_SECS);
                let next_attempt_at =
                    OffsetDateTime::now_utc() + time::Duration::seconds(backoff);

                warn!(
                    id = %notification.id,
                    attempts,
                    give_up,
                    error = %err,
                    "notification send failed"
                );
                store
                    .reschedule_notification(notification.id, attempts, next_attempt_at, give_up)
                    .await?;
            }
        }
    }
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fake::FakeStore;
    use crate::db::{NewOutboxNotification, OutboxNotification};
    use crate::notifications::sender::SendError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingSender {
        delivered: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        async fn send(&self, _notification: &OutboxNotification) -> Result<(), SendError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(SendError::Provider("boom".into()));
            }
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn delivered_notifications_are_marked_sent() {
        let store = FakeStore::new();
        store
            .enqueue_notification(&NewOutboxNotification::email(
                "jean@example.com",
                "subject",
                "body",
            ))
            .await
            .unwrap();

        let sender = RecordingSender::default();
        let sent = drain_once(&store, &sender).await.unwrap();
        assert_eq!(sent, 1);
        assert_eq!(sender.delivered.load(Ordering::SeqCst), 1);

        // Nothing left to drain.
        assert_eq!(drain_once(&store, &sender).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_sends_are_rescheduled_not_lost() {
        let store = FakeStore::new();
        store
            .enqueue_notification(&NewOutboxNotification::email(
                "jean@example.com",
                "subject",
                "body",
            ))
            .await
            .unwrap();

        let sender = RecordingSender::default();
        sender.fail.store(true, Ordering::SeqCst);

        let sent = drain_once(&store, &sender).await.unwrap();
        assert_eq!(sent, 0);

        // Pushed into the future with one recorded attempt, still pending.
        let all = store.due_notifications(10).await.unwrap();
        assert!(all.is_empty(), "rescheduled row must not be due immediately");
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let store = FakeStore::new();
        store
            .enqueue_notification(&NewOutboxNotification::email(
                "jean@example.com",
                "subject",
                "body",
            ))
            .await
            .unwrap();

        let due = store.due_notifications(1).await.unwrap();
        let id = due[0].id;
        store
            .reschedule_notification(id, MAX_ATTEMPTS - 1, OffsetDateTime::now_utc(), false)
            .await
            .unwrap();

        let sender = RecordingSender::default();
        sender.fail.store(true, Ordering::SeqCst);
        drain_once(&store, &sender).await.unwrap();

        // Terminal failure; the worker will not pick it up again.
        assert_eq!(store.due_notifications(10).await.unwrap().len(), 0);
    }
}
