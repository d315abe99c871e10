use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Picture reference given to new accounts
pub const DEFAULT_PROFILE_PIC: &str = "/image/default.png";

// ============================================================================
// Users
// ============================================================================

/// User entity - an account record
///
/// Follow edges live beside the record (see `UserRepository`), so a user's
/// followers/following sets are always read through the directory.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: i32,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile_pic: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            profile_pic: self.profile_pic.clone(),
        }
    }
}

/// Display fields used when another entity references a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub profile_pic: String,
}

/// Insert payload for a new account; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub password_hash: String,
    pub profile_pic: String,
}

// ============================================================================
// Posts & comments
// ============================================================================

/// Post entity with its like set and comments (oldest first)
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes: HashSet<Uuid>,
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// Comment entity - always addressed through its parent post
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub owner_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub likes: HashSet<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub owner_id: Uuid,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
}

// ============================================================================
// Notifications
// ============================================================================

/// What triggered a notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Someone liked the recipient's post
    Like,
    /// Someone commented on the recipient's post
    Comment,
    /// Someone started following the recipient
    Follow,
    /// Someone the recipient follows published a post
    Post,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Follow => "follow",
            NotificationKind::Post => "post",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(NotificationKind::Like),
            "comment" => Ok(NotificationKind::Comment),
            "follow" => Ok(NotificationKind::Follow),
            "post" => Ok(NotificationKind::Post),
            other => Err(format!("unknown notification kind: {}", other)),
        }
    }
}

/// Notification record; `read` only ever moves from false to true
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub actor_id: Uuid,
    /// Related post; may dangle after the post is deleted
    pub post_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub actor_id: Uuid,
    pub post_id: Option<Uuid>,
}
