use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::models::{NewNotification, NotificationKind};
use crate::domain::views::NotificationView;
use crate::error::Result;
use crate::metrics;
use crate::repository::{NotificationRepository, PostRepository, UserRepository};

/// Per-recipient notification outbox.
///
/// `notify` and `fan_out` are the only way notifications get created. Both are
/// best-effort: a failed write is logged and counted, never returned.
#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
}

impl NotificationService {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
    ) -> Self {
        Self {
            notifications,
            users,
            posts,
        }
    }

    /// Write one notification; returns whether it was stored.
    pub async fn notify(
        &self,
        recipient_id: Uuid,
        kind: NotificationKind,
        actor_id: Uuid,
        post_id: Option<Uuid>,
    ) -> bool {
        let result = self
            .notifications
            .create(NewNotification {
                recipient_id,
                kind,
                actor_id,
                post_id,
            })
            .await;

        match result {
            Ok(notification) => {
                debug!(
                    notification_id = %notification.id,
                    recipient_id = %recipient_id,
                    kind = %kind,
                    "Notification emitted"
                );
                metrics::record_notification_emitted(kind);
                true
            }
            Err(e) => {
                warn!(
                    recipient_id = %recipient_id,
                    actor_id = %actor_id,
                    kind = %kind,
                    "Failed to emit notification: {}",
                    e
                );
                metrics::record_notification_failed(kind);
                false
            }
        }
    }

    /// Sequentially notify every recipient; returns how many were stored.
    pub async fn fan_out(
        &self,
        recipients: &[Uuid],
        kind: NotificationKind,
        actor_id: Uuid,
        post_id: Option<Uuid>,
    ) -> usize {
        let mut delivered = 0;
        for recipient_id in recipients {
            if self.notify(*recipient_id, kind, actor_id, post_id).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// Newest-first notifications with actor and post title resolved.
    /// Does not change any `read` flag.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<NotificationView>> {
        let notifications = self.notifications.list_for_recipient(user_id).await?;

        let mut actor_ids: Vec<Uuid> = notifications.iter().map(|n| n.actor_id).collect();
        actor_ids.sort_unstable();
        actor_ids.dedup();

        let mut post_ids: Vec<Uuid> = notifications.iter().filter_map(|n| n.post_id).collect();
        post_ids.sort_unstable();
        post_ids.dedup();

        let actors: HashMap<Uuid, _> = self
            .users
            .summaries(&actor_ids)
            .await?
            .into_iter()
            .map(|summary| (summary.id, summary))
            .collect();
        let titles = self.posts.titles(&post_ids).await?;

        Ok(notifications
            .into_iter()
            .map(|n| NotificationView {
                id: n.id,
                kind: n.kind,
                read: n.read,
                created_at: n.created_at,
                actor: actors.get(&n.actor_id).cloned(),
                post_title: n.post_id.and_then(|id| titles.get(&id).cloned()),
                post_id: n.post_id,
            })
            .collect())
    }

    /// Flip every unread notification to read; returns how many flipped.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let flipped = self.notifications.mark_all_read(user_id).await?;
        debug!(user_id = %user_id, flipped, "Marked notifications read");
        Ok(flipped)
    }

    pub async fn clear_all(&self, user_id: Uuid) -> Result<u64> {
        let removed = self.notifications.delete_all(user_id).await?;
        debug!(user_id = %user_id, removed, "Cleared notifications");
        Ok(removed)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<u64> {
        self.notifications.count_unread(user_id).await
    }
}
