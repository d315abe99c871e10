//! Storage seams for users, posts and notifications.
//!
//! Each trait has a PostgreSQL implementation (sqlx) and is also implemented
//! by [`InMemoryStore`], which backs `STORAGE_BACKEND=memory` and the tests.
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::models::{
    Comment, NewNotification, NewPost, NewUser, Notification, Post, User, UserSummary,
};
use crate::error::Result;

pub mod memory;
pub mod notifications;
pub mod posts;
pub mod users;

pub use memory::InMemoryStore;
pub use notifications::PgNotificationRepository;
pub use posts::PgPostRepository;
pub use users::PgUserRepository;

/// User directory and follow graph
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Fails with `Conflict` when the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Display fields for the given ids; unknown ids are skipped
    async fn summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>>;

    /// Case-insensitive literal substring match on the name
    async fn search_by_name(&self, query: &str) -> Result<Vec<UserSummary>>;

    /// Returns false when the user does not exist
    async fn set_profile_pic(&self, user_id: Uuid, pic: &str) -> Result<bool>;

    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool>;

    /// Idempotent
    async fn add_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()>;

    /// Idempotent
    async fn remove_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()>;

    async fn follower_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;

    async fn following_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;
}

/// Posts with their likes, comments and comment likes
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, new_post: NewPost) -> Result<Post>;

    async fn find(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// All posts, newest first
    async fn list_recent(&self) -> Result<Vec<Post>>;

    /// One owner's posts, newest first
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Post>>;

    /// Replace title/body and bump `updated_at`. Returns false when missing.
    async fn update_content(&self, post_id: Uuid, title: &str, body: &str) -> Result<bool>;

    /// Delete the post with its comments and likes. Returns false when missing.
    async fn delete(&self, post_id: Uuid) -> Result<bool>;

    /// Flip the user's like on a post; returns true when the like is now present
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn add_comment(&self, post_id: Uuid, owner_id: Uuid, body: &str) -> Result<Comment>;

    /// Flip the user's like on a comment; returns true when the like is now present
    async fn toggle_comment_like(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Returns false when the comment does not belong to the post
    async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool>;

    /// Titles for the given post ids; deleted posts are absent
    async fn titles(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, String>>;
}

/// Per-recipient notification store
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, new_notification: NewNotification) -> Result<Notification>;

    /// Newest first
    async fn list_for_recipient(&self, recipient_id: Uuid) -> Result<Vec<Notification>>;

    async fn count_unread(&self, recipient_id: Uuid) -> Result<u64>;

    /// Returns how many notifications changed state
    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64>;

    async fn delete_all(&self, recipient_id: Uuid) -> Result<u64>;
}

/// Escape `%`, `_` and `\` so user input is matched literally by LIKE/ILIKE
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("ada"), "ada");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
        assert_eq!(escape_like(".*"), ".*");
    }
}
