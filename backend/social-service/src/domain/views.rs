//! Read models returned to clients, with references resolved for display.
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::models::{Comment, NotificationKind, Post, UserSummary};

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub owner_name: Option<String>,
    pub like_count: usize,
}

/// A post with its owner and comment authors resolved
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub owner: Option<UserSummary>,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub like_count: usize,
    pub likes: Vec<Uuid>,
    /// False for anonymous viewers
    pub liked_by_viewer: bool,
    pub comments: Vec<CommentView>,
}

impl PostView {
    pub fn from_post<F>(
        post: Post,
        owner: Option<UserSummary>,
        viewer: Option<Uuid>,
        owner_name: F,
    ) -> Self
    where
        F: Fn(Uuid) -> Option<String>,
    {
        let comments = post
            .comments
            .into_iter()
            .map(|comment| CommentView {
                owner_name: owner_name(comment.owner_id),
                like_count: comment.likes.len(),
                comment,
            })
            .collect();

        PostView {
            id: post.id,
            owner,
            title: post.title,
            body: post.body,
            image: post.image,
            created_at: post.created_at,
            updated_at: post.updated_at,
            like_count: post.likes.len(),
            liked_by_viewer: viewer.map_or(false, |id| post.likes.contains(&id)),
            likes: post.likes.into_iter().collect(),
            comments,
        }
    }
}

/// A user as seen on their profile page
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user: UserSummary,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    /// Newest first
    pub posts: Vec<PostView>,
    /// Whether the viewing user follows this profile (false when anonymous)
    pub is_following: bool,
}

/// A notification with actor and post resolved; dangling references are `None`
#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub actor: Option<UserSummary>,
    pub post_id: Option<Uuid>,
    pub post_title: Option<String>,
}
