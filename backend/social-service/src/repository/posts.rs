use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::PostRepository;
use crate::domain::models::{Comment, NewPost, Post};
use crate::error::Result;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    body: String,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    owner_id: Uuid,
    body: String,
    created_at: DateTime<Utc>,
}

/// PostgreSQL-backed posts, likes and comments
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach likes, comments and comment likes to a page of post rows,
    /// keeping the row order.
    async fn hydrate(&self, rows: Vec<PostRow>) -> Result<Vec<Post>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let like_rows = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT post_id, user_id FROM post_likes WHERE post_id = ANY($1)",
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let comment_rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, post_id, owner_id, body, created_at
            FROM comments
            WHERE post_id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let comment_ids: Vec<Uuid> = comment_rows.iter().map(|c| c.id).collect();
        let comment_like_rows = if comment_ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, (Uuid, Uuid)>(
                "SELECT comment_id, user_id FROM comment_likes WHERE comment_id = ANY($1)",
            )
            .bind(&comment_ids[..])
            .fetch_all(&self.pool)
            .await?
        };

        let mut likes: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        for (post_id, user_id) in like_rows {
            likes.entry(post_id).or_default().insert(user_id);
        }

        let mut comment_likes: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        for (comment_id, user_id) in comment_like_rows {
            comment_likes.entry(comment_id).or_default().insert(user_id);
        }

        let mut comments: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for row in comment_rows {
            comments.entry(row.post_id).or_default().push(Comment {
                likes: comment_likes.remove(&row.id).unwrap_or_default(),
                id: row.id,
                post_id: row.post_id,
                owner_id: row.owner_id,
                body: row.body,
                created_at: row.created_at,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| Post {
                likes: likes.remove(&row.id).unwrap_or_default(),
                comments: comments.remove(&row.id).unwrap_or_default(),
                id: row.id,
                owner_id: row.owner_id,
                title: row.title,
                body: row.body,
                image: row.image,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (id, owner_id, title, body, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, title, body, image, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_post.owner_id)
        .bind(&new_post.title)
        .bind(&new_post.body)
        .bind(&new_post.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(Post {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            body: row.body,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
            likes: HashSet::new(),
            comments: Vec::new(),
        })
    }

    async fn find(&self, post_id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, owner_id, title, body, image, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_recent(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, owner_id, title, body, image, created_at, updated_at
            FROM posts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, owner_id, title, body, image, created_at, updated_at
            FROM posts
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn update_content(&self, post_id: Uuid, title: &str, body: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = $2, body = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(title)
        .bind(body)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, post_id: Uuid) -> Result<bool> {
        // post_likes, comments and comment_likes cascade
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    async fn add_comment(&self, post_id: Uuid, owner_id: Uuid, body: &str) -> Result<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (id, post_id, owner_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, owner_id, body, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(owner_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;

        Ok(Comment {
            id: row.id,
            post_id: row.post_id,
            owner_id: row.owner_id,
            body: row.body,
            created_at: row.created_at,
            likes: HashSet::new(),
        })
    }

    async fn toggle_comment_like(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool> {
        let removed =
            sqlx::query("DELETE FROM comment_likes WHERE comment_id = $1 AND user_id = $2")
                .bind(comment_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO comment_likes (comment_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (comment_id, user_id) DO NOTHING
            "#,
        )
        .bind(comment_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND post_id = $2")
            .bind(comment_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn titles(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, title FROM posts WHERE id = ANY($1)",
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}
