//! Post repository
//!
//! Listing queries filter and order in SQL. The visibility condition used
//! here must stay equivalent to `services::access::is_publicly_visible`.

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::{
    ListParams, Post, PostCategory, PostFilter, PostInput, PostLocation, PostScope, PostWithMeta,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

/// SQL form of the public visibility rule; binds one timestamp (`now`).
pub const VISIBLE_CONDITION: &str =
    "(p.is_published = 1 AND p.pub_date <= ? AND (p.category_id IS NULL OR c.is_published = 1))";

const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.text, p.pub_date, p.is_published, p.created_at,
           p.author_id, p.category_id, p.location_id, p.image,
           u.username AS author_username,
           c.title AS category_title, c.slug AS category_slug,
           c.is_published AS category_is_published,
           l.name AS location_name, l.is_published AS location_is_published,
           (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
    FROM posts p
    INNER JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
"#;

const POST_FROM: &str = r#"
    FROM posts p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

macro_rules! post_from_row {
    ($row:expr) => {{
        let row = &$row;
        let category_id: Option<i64> = row.try_get("category_id")?;
        let location_id: Option<i64> = row.try_get("location_id")?;

        let category = match category_id {
            Some(id) => Some(PostCategory {
                id,
                title: row
                    .try_get::<Option<String>, _>("category_title")?
                    .unwrap_or_default(),
                slug: row
                    .try_get::<Option<String>, _>("category_slug")?
                    .unwrap_or_default(),
                is_published: row
                    .try_get::<Option<bool>, _>("category_is_published")?
                    .unwrap_or(false),
            }),
            None => None,
        };
        let location = match location_id {
            Some(id) => Some(PostLocation {
                id,
                name: row
                    .try_get::<Option<String>, _>("location_name")?
                    .unwrap_or_default(),
                is_published: row
                    .try_get::<Option<bool>, _>("location_is_published")?
                    .unwrap_or(false),
            }),
            None => None,
        };

        PostWithMeta {
            post: Post {
                id: row.try_get("id")?,
                title: row.try_get("title")?,
                text: row.try_get("text")?,
                pub_date: row.try_get("pub_date")?,
                is_published: row.try_get("is_published")?,
                created_at: row.try_get("created_at")?,
                author_id: row.try_get("author_id")?,
                category_id,
                location_id,
                image: row.try_get("image")?,
            },
            author_username: row.try_get("author_username")?,
            category,
            location,
            comment_count: row.try_get("comment_count")?,
        }
    }};
}

/// Values bound to a dynamically built WHERE clause
#[derive(Debug, Clone)]
enum Arg {
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
}

macro_rules! bind_args {
    ($query:expr, $args:expr) => {{
        let mut query = $query;
        for arg in $args {
            query = match arg {
                Arg::Int(v) => query.bind(*v),
                Arg::Text(v) => query.bind(v.as_str()),
                Arg::Time(v) => query.bind(*v),
            };
        }
        query
    }};
}

/// Translate a listing filter into a WHERE clause and its bind values
fn build_where(filter: &PostFilter) -> (String, Vec<Arg>) {
    let mut conditions = Vec::new();
    let mut args = Vec::new();

    match filter.scope {
        PostScope::All => {}
        PostScope::Visible(now) => {
            conditions.push(VISIBLE_CONDITION.to_string());
            args.push(Arg::Time(now));
        }
        PostScope::Hidden(now) => {
            conditions.push(format!("NOT {}", VISIBLE_CONDITION));
            args.push(Arg::Time(now));
        }
    }

    if let Some(author_id) = filter.author_id {
        conditions.push("p.author_id = ?".to_string());
        args.push(Arg::Int(author_id));
    }

    if let Some(category_id) = filter.category_id {
        conditions.push("p.category_id = ?".to_string());
        args.push(Arg::Int(category_id));
    }

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        match search.parse::<i64>() {
            Ok(id) => {
                conditions.push("(p.id = ? OR p.title LIKE ?)".to_string());
                args.push(Arg::Int(id));
                args.push(Arg::Text(pattern));
            }
            Err(_) => {
                conditions.push("p.title LIKE ?".to_string());
                args.push(Arg::Text(pattern));
            }
        }
    }

    if conditions.is_empty() {
        (String::new(), args)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), args)
    }
}

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a post written by `author_id`
    async fn create(&self, author_id: i64, input: &PostInput) -> Result<Post>;

    /// Get a post with its metadata, regardless of visibility
    async fn get_by_id(&self, id: i64) -> Result<Option<PostWithMeta>>;

    /// Replace a post's editable fields
    async fn update(&self, id: i64, input: &PostInput) -> Result<Option<Post>>;

    /// Delete a post and, through the schema, its comments
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Page through posts matching `filter`, newest publication date first
    async fn list(&self, filter: &PostFilter, params: &ListParams)
        -> Result<(Vec<PostWithMeta>, i64)>;

    /// Count posts matching `filter`
    async fn count(&self, filter: &PostFilter) -> Result<i64>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }

    async fn get_row(&self, id: i64) -> Result<Option<Post>> {
        Ok(self.get_by_id(id).await?.map(|p| p.post))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, author_id: i64, input: &PostInput) -> Result<Post> {
        let id = with_pool!(self.pool, conn => {
            sqlx::query(
                r#"
                INSERT INTO posts (title, text, pub_date, is_published, created_at,
                                   author_id, category_id, location_id, image)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&input.title)
            .bind(&input.text)
            .bind(input.pub_date)
            .bind(input.is_published)
            .bind(Utc::now())
            .bind(author_id)
            .bind(input.category_id)
            .bind(input.location_id)
            .bind(input.image.as_deref())
            .execute(conn)
            .await
            .context("Failed to create post")?
            .inserted_id()
        });

        self.get_row(id)
            .await?
            .context("Post not found after creation")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<PostWithMeta>> {
        let sql = format!("{} WHERE p.id = ?", POST_SELECT);
        with_pool!(self.pool, conn => {
            let row = sqlx::query(&sql)
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("Failed to get post by ID")?;
            match row {
                Some(row) => Ok(Some(post_from_row!(row))),
                None => Ok(None),
            }
        })
    }

    async fn update(&self, id: i64, input: &PostInput) -> Result<Option<Post>> {
        with_pool!(self.pool, conn => {
            sqlx::query(
                r#"
                UPDATE posts
                SET title = ?, text = ?, pub_date = ?, is_published = ?,
                    category_id = ?, location_id = ?, image = ?
                WHERE id = ?
                "#,
            )
            .bind(&input.title)
            .bind(&input.text)
            .bind(input.pub_date)
            .bind(input.is_published)
            .bind(input.category_id)
            .bind(input.location_id)
            .bind(input.image.as_deref())
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update post")?;
        });

        self.get_row(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        with_pool!(self.pool, conn => {
            let result = sqlx::query("DELETE FROM posts WHERE id = ?")
                .bind(id)
                .execute(conn)
                .await
                .context("Failed to delete post")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn list(
        &self,
        filter: &PostFilter,
        params: &ListParams,
    ) -> Result<(Vec<PostWithMeta>, i64)> {
        let total = self.count(filter).await?;

        let (where_clause, args) = build_where(filter);
        let sql = format!(
            "{}{} ORDER BY p.pub_date DESC, p.id DESC LIMIT ? OFFSET ?",
            POST_SELECT, where_clause
        );

        with_pool!(self.pool, conn => {
            let query = bind_args!(sqlx::query(&sql), &args);
            let rows = query
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(conn)
                .await
                .context("Failed to list posts")?;

            let mut posts = Vec::with_capacity(rows.len());
            for row in rows {
                posts.push(post_from_row!(row));
            }
            Ok((posts, total))
        })
    }

    async fn count(&self, filter: &PostFilter) -> Result<i64> {
        let (where_clause, args) = build_where(filter);
        let sql = format!("SELECT COUNT(*) {}{}", POST_FROM, where_clause);

        with_pool!(self.pool, conn => {
            let query = bind_args!(sqlx::query_scalar::<_, i64>(&sql), &args);
            let count = query
                .fetch_one(conn)
                .await
                .context("Failed to count posts")?;
            Ok(count)
        })
    }
}
