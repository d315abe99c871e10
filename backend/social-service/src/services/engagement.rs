use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::NotificationService;
use crate::domain::models::{Comment, NewPost, NotificationKind, Post, UserSummary};
use crate::domain::views::PostView;
use crate::error::{AppError, Result};
use crate::repository::{PostRepository, UserRepository};

/// New post input
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PostDraft {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title and content are required."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Title and content are required."))]
    pub body: String,
    /// Reference to an already stored image
    #[serde(default)]
    pub image: Option<String>,
}

/// Replacement title/body for an existing post
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PostEdit {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title and content are required."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Title and content are required."))]
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CommentDraft {
    #[serde(default)]
    #[validate(length(min = 1, message = "Comment cannot be empty."))]
    pub body: String,
}

/// Like state after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: usize,
}

/// Posts, comments and their like sets
#[derive(Clone)]
pub struct EngagementService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    notifications: NotificationService,
}

impl EngagementService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            posts,
            users,
            notifications,
        }
    }

    async fn require_post(&self, post_id: Uuid) -> Result<Post> {
        self.posts
            .find(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    /// Store a post, then notify every current follower of the owner
    pub async fn create_post(&self, owner_id: Uuid, draft: PostDraft) -> Result<Post> {
        draft.validate()?;

        let post = self
            .posts
            .create(NewPost {
                owner_id,
                title: draft.title,
                body: draft.body,
                image: draft.image.filter(|image| !image.is_empty()),
            })
            .await?;
        info!(post_id = %post.id, owner_id = %owner_id, "Post created");

        match self.users.follower_ids(owner_id).await {
            Ok(followers) => {
                self.notifications
                    .fan_out(&followers, NotificationKind::Post, owner_id, Some(post.id))
                    .await;
            }
            Err(e) => {
                warn!(post_id = %post.id, "Skipping post fan-out, follower lookup failed: {}", e);
            }
        }

        Ok(post)
    }

    /// Toggle `user_id`'s like; a new like by someone other than the owner
    /// notifies the owner
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeOutcome> {
        let post = self.require_post(post_id).await?;

        let liked = self.posts.toggle_like(post_id, user_id).await?;
        let mut likes = post.likes;
        if liked {
            likes.insert(user_id);
            if post.owner_id != user_id {
                self.notifications
                    .notify(post.owner_id, NotificationKind::Like, user_id, Some(post_id))
                    .await;
            }
        } else {
            likes.remove(&user_id);
        }

        Ok(LikeOutcome {
            liked,
            like_count: likes.len(),
        })
    }

    pub async fn add_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        draft: CommentDraft,
    ) -> Result<Comment> {
        draft.validate()?;
        let post = self.require_post(post_id).await?;

        let comment = self.posts.add_comment(post_id, user_id, &draft.body).await?;

        if post.owner_id != user_id {
            self.notifications
                .notify(post.owner_id, NotificationKind::Comment, user_id, Some(post_id))
                .await;
        }

        Ok(comment)
    }

    pub async fn edit_post(&self, post_id: Uuid, requester: Uuid, edit: PostEdit) -> Result<Post> {
        edit.validate()?;
        let post = self.require_post(post_id).await?;
        if !post.is_owned_by(requester) {
            return Err(AppError::Forbidden("Not authorized".to_string()));
        }

        if !self
            .posts
            .update_content(post_id, &edit.title, &edit.body)
            .await?
        {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        self.require_post(post_id).await
    }

    /// Remove the post with its comments. Notifications that point at it are
    /// left dangling.
    pub async fn delete_post(&self, post_id: Uuid, requester: Uuid) -> Result<()> {
        let post = self.require_post(post_id).await?;
        if !post.is_owned_by(requester) {
            return Err(AppError::Forbidden("Not authorized".to_string()));
        }

        self.posts.delete(post_id).await?;
        info!(post_id = %post_id, "Post deleted");
        Ok(())
    }

    pub async fn toggle_comment_like(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeOutcome> {
        let post = self.require_post(post_id).await?;
        let comment = post
            .comment(comment_id)
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        let liked = self.posts.toggle_comment_like(comment_id, user_id).await?;
        let mut likes = comment.likes.clone();
        if liked {
            likes.insert(user_id);
        } else {
            likes.remove(&user_id);
        }

        Ok(LikeOutcome {
            liked,
            like_count: likes.len(),
        })
    }

    /// The comment owner or the post owner may delete a comment
    pub async fn delete_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        requester: Uuid,
    ) -> Result<()> {
        let post = self.require_post(post_id).await?;
        let comment = post
            .comment(comment_id)
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        if comment.owner_id != requester && !post.is_owned_by(requester) {
            return Err(AppError::Forbidden("Not authorized".to_string()));
        }

        if !self.posts.delete_comment(post_id, comment_id).await? {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }
        Ok(())
    }

    /// Every post, newest first
    pub async fn feed(&self, viewer: Option<Uuid>) -> Result<Vec<PostView>> {
        let posts = self.posts.list_recent().await?;
        self.resolve(posts, viewer).await
    }

    /// One owner's posts, newest first
    pub async fn posts_by(&self, owner_id: Uuid, viewer: Option<Uuid>) -> Result<Vec<PostView>> {
        let posts = self.posts.list_by_owner(owner_id).await?;
        self.resolve(posts, viewer).await
    }

    async fn resolve(&self, posts: Vec<Post>, viewer: Option<Uuid>) -> Result<Vec<PostView>> {
        let mut ids: Vec<Uuid> = posts
            .iter()
            .flat_map(|p| std::iter::once(p.owner_id).chain(p.comments.iter().map(|c| c.owner_id)))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let people: HashMap<Uuid, UserSummary> = self
            .users
            .summaries(&ids)
            .await?
            .into_iter()
            .map(|summary| (summary.id, summary))
            .collect();

        Ok(posts
            .into_iter()
            .map(|post| {
                let owner = people.get(&post.owner_id).cloned();
                PostView::from_post(post, owner, viewer, |id| {
                    people.get(&id).map(|s| s.name.clone())
                })
            })
            .collect())
    }
}

impl PostDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            image: None,
        }
    }
}

impl CommentDraft {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}
