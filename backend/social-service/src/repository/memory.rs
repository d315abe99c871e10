//! Process-local store implementing every repository trait.
//!
//! Entries are sharded in `DashMap`s. A toggle on one post or one follow side
//! is atomic; nothing spans entities. Never hold a map guard while touching
//! another key of the same map.
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use super::{NotificationRepository, PostRepository, UserRepository};
use crate::domain::models::{
    Comment, NewNotification, NewPost, NewUser, Notification, Post, User, UserSummary,
};
use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
struct StoredPost {
    /// Insertion order; higher is newer
    seq: u64,
    post: Post,
}

#[derive(Default)]
pub struct InMemoryStore {
    users: DashMap<Uuid, User>,
    emails: DashMap<String, Uuid>,
    /// followee -> followers, in follow order
    followers: DashMap<Uuid, Vec<Uuid>>,
    /// follower -> followees, in follow order
    following: DashMap<Uuid, Vec<Uuid>>,
    posts: DashMap<Uuid, StoredPost>,
    /// comment -> parent post
    comment_posts: DashMap<Uuid, Uuid>,
    /// recipient -> notifications, oldest first
    notifications: DashMap<Uuid, Vec<Notification>>,
    seq: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn sorted_newest_first(mut stored: Vec<StoredPost>) -> Vec<Post> {
        stored.sort_by(|a, b| b.seq.cmp(&a.seq));
        stored.into_iter().map(|s| s.post).collect()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let id = Uuid::new_v4();

        match self.emails.entry(new_user.email.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(
                    "A user with this email already exists.".to_string(),
                ))
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let user = User {
            id,
            name: new_user.name,
            email: new_user.email,
            age: new_user.age,
            password_hash: new_user.password_hash,
            profile_pic: new_user.profile_pic,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let id = match self.emails.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.find_by_id(id).await
    }

    async fn summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.summary()))
            .collect())
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<UserSummary>> {
        let needle = query.to_lowercase();
        let mut found: Vec<UserSummary> = self
            .users
            .iter()
            .filter(|u| u.name.to_lowercase().contains(&needle))
            .map(|u| u.summary())
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn set_profile_pic(&self, user_id: Uuid, pic: &str) -> Result<bool> {
        match self.users.get_mut(&user_id) {
            Some(mut user) => {
                user.profile_pic = pic.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        Ok(self
            .following
            .get(&follower_id)
            .map(|list| list.contains(&followee_id))
            .unwrap_or(false))
    }

    async fn add_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        {
            let mut list = self.following.entry(follower_id).or_default();
            if !list.contains(&followee_id) {
                list.push(followee_id);
            }
        }
        let mut list = self.followers.entry(followee_id).or_default();
        if !list.contains(&follower_id) {
            list.push(follower_id);
        }
        Ok(())
    }

    async fn remove_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        if let Some(mut list) = self.following.get_mut(&follower_id) {
            list.retain(|id| *id != followee_id);
        }
        if let Some(mut list) = self.followers.get_mut(&followee_id) {
            list.retain(|id| *id != follower_id);
        }
        Ok(())
    }

    async fn follower_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .followers
            .get(&user_id)
            .map(|list| list.value().clone())
            .unwrap_or_default())
    }

    async fn following_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .following
            .get(&user_id)
            .map(|list| list.value().clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, new_post: NewPost) -> Result<Post> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            owner_id: new_post.owner_id,
            title: new_post.title,
            body: new_post.body,
            image: new_post.image,
            created_at: now,
            updated_at: now,
            likes: HashSet::new(),
            comments: Vec::new(),
        };

        self.posts.insert(
            post.id,
            StoredPost {
                seq: self.next_seq(),
                post: post.clone(),
            },
        );

        Ok(post)
    }

    async fn find(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.get(&post_id).map(|s| s.post.clone()))
    }

    async fn list_recent(&self) -> Result<Vec<Post>> {
        let stored = self.posts.iter().map(|s| s.value().clone()).collect();
        Ok(Self::sorted_newest_first(stored))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Post>> {
        let stored = self
            .posts
            .iter()
            .filter(|s| s.post.owner_id == owner_id)
            .map(|s| s.value().clone())
            .collect();
        Ok(Self::sorted_newest_first(stored))
    }

    async fn update_content(&self, post_id: Uuid, title: &str, body: &str) -> Result<bool> {
        match self.posts.get_mut(&post_id) {
            Some(mut stored) => {
                stored.post.title = title.to_string();
                stored.post.body = body.to_string();
                stored.post.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, post_id: Uuid) -> Result<bool> {
        match self.posts.remove(&post_id) {
            Some((_, stored)) => {
                for comment in &stored.post.comments {
                    self.comment_posts.remove(&comment.id);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut stored = self
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let likes = &mut stored.post.likes;
        if likes.remove(&user_id) {
            Ok(false)
        } else {
            likes.insert(user_id);
            Ok(true)
        }
    }

    async fn add_comment(&self, post_id: Uuid, owner_id: Uuid, body: &str) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            owner_id,
            body: body.to_string(),
            created_at: Utc::now(),
            likes: HashSet::new(),
        };

        {
            let mut stored = self
                .posts
                .get_mut(&post_id)
                .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
            stored.post.comments.push(comment.clone());
        }
        self.comment_posts.insert(comment.id, post_id);

        Ok(comment)
    }

    async fn toggle_comment_like(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool> {
        let not_found = || AppError::NotFound("Comment not found".to_string());

        let post_id = self
            .comment_posts
            .get(&comment_id)
            .map(|p| *p)
            .ok_or_else(not_found)?;

        let mut stored = self.posts.get_mut(&post_id).ok_or_else(not_found)?;
        let comment = stored
            .post
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(not_found)?;

        if comment.likes.remove(&user_id) {
            Ok(false)
        } else {
            comment.likes.insert(user_id);
            Ok(true)
        }
    }

    async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool> {
        let removed = match self.posts.get_mut(&post_id) {
            Some(mut stored) => {
                let before = stored.post.comments.len();
                stored.post.comments.retain(|c| c.id != comment_id);
                stored.post.comments.len() < before
            }
            None => false,
        };

        if removed {
            self.comment_posts.remove(&comment_id);
        }
        Ok(removed)
    }

    async fn titles(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
        Ok(post_ids
            .iter()
            .filter_map(|id| self.posts.get(id).map(|s| (*id, s.post.title.clone())))
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn create(&self, new_notification: NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: new_notification.recipient_id,
            kind: new_notification.kind,
            actor_id: new_notification.actor_id,
            post_id: new_notification.post_id,
            read: false,
            created_at: Utc::now(),
        };

        self.notifications
            .entry(notification.recipient_id)
            .or_default()
            .push(notification.clone());

        Ok(notification)
    }

    async fn list_for_recipient(&self, recipient_id: Uuid) -> Result<Vec<Notification>> {
        Ok(self
            .notifications
            .get(&recipient_id)
            .map(|list| list.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn count_unread(&self, recipient_id: Uuid) -> Result<u64> {
        Ok(self
            .notifications
            .get(&recipient_id)
            .map(|list| list.iter().filter(|n| !n.read).count() as u64)
            .unwrap_or(0))
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64> {
        let mut flipped = 0;
        if let Some(mut list) = self.notifications.get_mut(&recipient_id) {
            for notification in list.iter_mut().filter(|n| !n.read) {
                notification.read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn delete_all(&self, recipient_id: Uuid) -> Result<u64> {
        Ok(self
            .notifications
            .remove(&recipient_id)
            .map(|(_, list)| list.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{NotificationKind, DEFAULT_PROFILE_PIC};

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            age: 30,
            password_hash: "hash".to_string(),
            profile_pic: DEFAULT_PROFILE_PIC.to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        UserRepository::create(&store, new_user("Ada", "ada@example.com"))
            .await
            .unwrap();

        let err = UserRepository::create(&store, new_user("Other", "ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_follow_edges_are_symmetric_and_unique() {
        let store = InMemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store.add_follow(a, b).await.unwrap();
        store.add_follow(a, b).await.unwrap();

        assert_eq!(store.following_ids(a).await.unwrap(), vec![b]);
        assert_eq!(store.follower_ids(b).await.unwrap(), vec![a]);
        assert!(store.is_following(a, b).await.unwrap());
        assert!(!store.is_following(b, a).await.unwrap());

        store.remove_follow(a, b).await.unwrap();
        assert!(store.following_ids(a).await.unwrap().is_empty());
        assert!(store.follower_ids(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_posts_listed_newest_first() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        let mut ids = Vec::new();
        for title in ["one", "two", "three"] {
            let post = PostRepository::create(
                &store,
                NewPost {
                    owner_id: owner,
                    title: title.to_string(),
                    body: "body".to_string(),
                    image: None,
                },
            )
            .await
            .unwrap();
            ids.push(post.id);
        }

        let listed: Vec<Uuid> = store.list_recent().await.unwrap().iter().map(|p| p.id).collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_delete_post_drops_comment_index() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        let post = PostRepository::create(
            &store,
            NewPost {
                owner_id: owner,
                title: "t".to_string(),
                body: "b".to_string(),
                image: None,
            },
        )
        .await
        .unwrap();
        let comment = store.add_comment(post.id, owner, "hi").await.unwrap();

        assert!(store.delete(post.id).await.unwrap());
        assert!(store.toggle_comment_like(comment.id, owner).await.is_err());
        assert!(!store.delete(post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_notifications_newest_first_and_mark_read() {
        let store = InMemoryStore::new();
        let recipient = Uuid::new_v4();
        let actor = Uuid::new_v4();

        for kind in [NotificationKind::Follow, NotificationKind::Like] {
            NotificationRepository::create(
                &store,
                NewNotification {
                    recipient_id: recipient,
                    kind,
                    actor_id: actor,
                    post_id: None,
                },
            )
            .await
            .unwrap();
        }

        let listed = store.list_for_recipient(recipient).await.unwrap();
        assert_eq!(listed[0].kind, NotificationKind::Like);
        assert_eq!(listed[1].kind, NotificationKind::Follow);

        assert_eq!(store.count_unread(recipient).await.unwrap(), 2);
        assert_eq!(store.mark_all_read(recipient).await.unwrap(), 2);
        assert_eq!(store.mark_all_read(recipient).await.unwrap(), 0);
        assert_eq!(store.delete_all(recipient).await.unwrap(), 2);
        assert!(store.list_for_recipient(recipient).await.unwrap().is_empty());
    }
}
