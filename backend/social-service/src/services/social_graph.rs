use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{EngagementService, NotificationService};
use crate::domain::models::{NotificationKind, UserSummary};
use crate::domain::views::UserProfile;
use crate::error::{AppError, Result};
use crate::repository::UserRepository;

/// Resulting state of a follow toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowOutcome {
    Followed,
    Unfollowed,
}

impl FollowOutcome {
    pub fn is_following(&self) -> bool {
        matches!(self, FollowOutcome::Followed)
    }
}

/// Follow graph and user lookup
#[derive(Clone)]
pub struct SocialGraphService {
    users: Arc<dyn UserRepository>,
    engagement: EngagementService,
    notifications: NotificationService,
}

impl SocialGraphService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        engagement: EngagementService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            users,
            engagement,
            notifications,
        }
    }

    /// Toggle `actor_id` following `target_id`.
    ///
    /// Both sides of the edge are written together; a new follow notifies the
    /// target. Unfollowing never notifies.
    pub async fn follow(&self, actor_id: Uuid, target_id: Uuid) -> Result<FollowOutcome> {
        if actor_id == target_id {
            return Err(AppError::InvalidOperation(
                "You cannot follow yourself.".to_string(),
            ));
        }

        if self.users.find_by_id(target_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        if self.users.is_following(actor_id, target_id).await? {
            self.users.remove_follow(actor_id, target_id).await?;
            info!(follower_id = %actor_id, followee_id = %target_id, "Unfollowed");
            return Ok(FollowOutcome::Unfollowed);
        }

        self.users.add_follow(actor_id, target_id).await?;
        info!(follower_id = %actor_id, followee_id = %target_id, "Followed");

        self.notifications
            .notify(target_id, NotificationKind::Follow, actor_id, None)
            .await;

        Ok(FollowOutcome::Followed)
    }

    /// Users whose name contains `query`, ignoring case. The query is
    /// matched literally.
    pub async fn search(&self, query: &str) -> Result<Vec<UserSummary>> {
        self.users.search_by_name(query).await
    }

    pub async fn followers(&self, user_id: Uuid) -> Result<Vec<UserSummary>> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let ids = self.users.follower_ids(user_id).await?;
        self.users.summaries(&ids).await
    }

    /// Profile page data; `viewer` decides `is_following`
    pub async fn profile(&self, user_id: Uuid, viewer: Option<Uuid>) -> Result<UserProfile> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let followers = self.users.follower_ids(user_id).await?;
        let following = self.users.following_ids(user_id).await?;
        let posts = self.engagement.posts_by(user_id, viewer).await?;
        let is_following = viewer.map_or(false, |viewer_id| followers.contains(&viewer_id));

        Ok(UserProfile {
            user: user.summary(),
            followers,
            following,
            posts,
            is_following,
        })
    }
}
