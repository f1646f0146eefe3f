//! Comment repository
//!
//! Database operations for comments under posts.

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::{Comment, CommentWithMeta, ListParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

const COMMENT_SELECT: &str = r#"
    SELECT cm.id, cm.text, cm.created_at, cm.post_id, cm.author_id,
           u.username AS author_username, p.title AS post_title
    FROM comments cm
    INNER JOIN users u ON u.id = cm.author_id
    INNER JOIN posts p ON p.id = cm.post_id
"#;

macro_rules! comment_from_row {
    ($row:expr) => {
        CommentWithMeta {
            comment: Comment {
                id: $row.try_get("id")?,
                text: $row.try_get("text")?,
                created_at: $row.try_get("created_at")?,
                post_id: $row.try_get("post_id")?,
                author_id: $row.try_get("author_id")?,
            },
            author_username: $row.try_get("author_username")?,
            post_title: $row.try_get("post_title")?,
        }
    };
}

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a comment on `post_id`
    async fn create(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment>;

    /// Get comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<CommentWithMeta>>;

    /// Replace a comment's text
    async fn update_text(&self, id: i64, text: &str) -> Result<Option<CommentWithMeta>>;

    /// Delete a comment
    async fn delete(&self, id: i64) -> Result<bool>;

    /// All comments of a post, oldest first
    async fn list_by_post(&self, post_id: i64) -> Result<Vec<CommentWithMeta>>;

    /// Page through comments, newest first, matching an exact post id or an
    /// author username fragment
    async fn list(&self, search: Option<&str>, params: &ListParams)
        -> Result<(Vec<CommentWithMeta>, i64)>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    /// Create a new SQLx comment repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment> {
        let id = with_pool!(self.pool, conn => {
            sqlx::query(
                "INSERT INTO comments (text, created_at, post_id, author_id) VALUES (?, ?, ?, ?)",
            )
            .bind(text)
            .bind(Utc::now())
            .bind(post_id)
            .bind(author_id)
            .execute(conn)
            .await
            .context("Failed to create comment")?
            .inserted_id()
        });

        self.get_by_id(id)
            .await?
            .map(|c| c.comment)
            .context("Comment not found after creation")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<CommentWithMeta>> {
        let sql = format!("{} WHERE cm.id = ?", COMMENT_SELECT);
        with_pool!(self.pool, conn => {
            let row = sqlx::query(&sql)
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("Failed to get comment by ID")?;
            match row {
                Some(row) => Ok(Some(comment_from_row!(row))),
                None => Ok(None),
            }
        })
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<Option<CommentWithMeta>> {
        with_pool!(self.pool, conn => {
            sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
                .bind(text)
                .bind(id)
                .execute(conn)
                .await
                .context("Failed to update comment")?;
        });

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        with_pool!(self.pool, conn => {
            let result = sqlx::query("DELETE FROM comments WHERE id = ?")
                .bind(id)
                .execute(conn)
                .await
                .context("Failed to delete comment")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn list_by_post(&self, post_id: i64) -> Result<Vec<CommentWithMeta>> {
        let sql = format!(
            "{} WHERE cm.post_id = ? ORDER BY cm.created_at ASC, cm.id ASC",
            COMMENT_SELECT
        );
        with_pool!(self.pool, conn => {
            let rows = sqlx::query(&sql)
                .bind(post_id)
                .fetch_all(conn)
                .await
                .context("Failed to list comments by post")?;
            let mut comments = Vec::with_capacity(rows.len());
            for row in rows {
                comments.push(comment_from_row!(row));
            }
            Ok(comments)
        })
    }

    async fn list(
        &self,
        search: Option<&str>,
        params: &ListParams,
    ) -> Result<(Vec<CommentWithMeta>, i64)> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let post_id = search.and_then(|s| s.parse::<i64>().ok()).unwrap_or(-1);
        let pattern = format!("%{}%", search.unwrap_or(""));
        let condition = "(cm.post_id = ? OR u.username LIKE ?)";

        let count_sql = format!(
            "SELECT COUNT(*) FROM comments cm INNER JOIN users u ON u.id = cm.author_id WHERE {}",
            condition
        );
        let sql = format!(
            "{} WHERE {} ORDER BY cm.created_at DESC, cm.id DESC LIMIT ? OFFSET ?",
            COMMENT_SELECT, condition
        );

        with_pool!(self.pool, conn => {
            let total: i64 = sqlx::query_scalar(&count_sql)
                .bind(post_id)
                .bind(&pattern)
                .fetch_one(conn)
                .await
                .context("Failed to count comments")?;

            let rows = sqlx::query(&sql)
                .bind(post_id)
                .bind(&pattern)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(conn)
                .await
                .context("Failed to list comments")?;

            let mut comments = Vec::with_capacity(rows.len());
            for row in rows {
                comments.push(comment_from_row!(row));
            }
            Ok((comments, total))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        PostRepository, SqlxPostRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{PostInput, User};

    struct Fixture {
        comments: Arc<dyn CommentRepository>,
        post_id: i64,
        other_post_id: i64,
        alice: i64,
        bob: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let alice = users
            .create(&User::new("alice".to_string(), "hash".to_string(), false))
            .await
            .unwrap();
        let bob = users
            .create(&User::new("bob".to_string(), "hash".to_string(), false))
            .await
            .unwrap();

        let posts = SqlxPostRepository::new(pool.clone());
        let new_post = |title: &str| PostInput {
            title: title.to_string(),
            text: "text".to_string(),
            pub_date: Utc::now(),
            is_published: true,
            category_id: None,
            location_id: None,
            image: None,
        };
        let post = posts.create(alice.id, &new_post("first")).await.unwrap();
        let other = posts.create(alice.id, &new_post("second")).await.unwrap();

        Fixture {
            comments: SqlxCommentRepository::boxed(pool),
            post_id: post.id,
            other_post_id: other.id,
            alice: alice.id,
            bob: bob.id,
        }
    }

    #[tokio::test]
    async fn test_comments_listed_oldest_first() {
        let f = setup().await;

        for text in ["one", "two", "three"] {
            f.comments.create(f.post_id, f.bob, text).await.unwrap();
        }
        f.comments
            .create(f.other_post_id, f.bob, "elsewhere")
            .await
            .unwrap();

        let listed = f.comments.list_by_post(f.post_id).await.unwrap();
        let texts: Vec<_> = listed.iter().map(|c| c.comment.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(listed[0].author_username, "bob");
        assert_eq!(listed[0].post_title, "first");
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one() {
        let f = setup().await;

        let first = f.comments.create(f.post_id, f.bob, "one").await.unwrap();
        let second = f.comments.create(f.post_id, f.alice, "two").await.unwrap();
        let third = f.comments.create(f.post_id, f.bob, "three").await.unwrap();

        assert!(f.comments.delete(second.id).await.unwrap());

        let remaining: Vec<_> = f
            .comments
            .list_by_post(f.post_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.comment.id)
            .collect();
        assert_eq!(remaining, vec![first.id, third.id]);
    }

    #[tokio::test]
    async fn test_update_text() {
        let f = setup().await;

        let comment = f.comments.create(f.post_id, f.bob, "draft").await.unwrap();
        let updated = f
            .comments
            .update_text(comment.id, "final")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.comment.text, "final");
        assert_eq!(updated.comment.created_at, comment.created_at);
    }

    #[tokio::test]
    async fn test_admin_search_by_post_or_author() {
        let f = setup().await;

        f.comments.create(f.post_id, f.bob, "a").await.unwrap();
        f.comments.create(f.other_post_id, f.alice, "b").await.unwrap();
        f.comments.create(f.other_post_id, f.bob, "c").await.unwrap();

        let params = ListParams::new(1, 100);
        let (_, by_author) = f.comments.list(Some("bob"), &params).await.unwrap();
        assert_eq!(by_author, 2);

        let (found, by_post) = f
            .comments
            .list(Some(&f.other_post_id.to_string()), &params)
            .await
            .unwrap();
        assert_eq!(by_post, 2);
        assert!(found.iter().all(|c| c.comment.post_id == f.other_post_id));

        let (_, everything) = f.comments.list(None, &params).await.unwrap();
        assert_eq!(everything, 3);
    }
}
