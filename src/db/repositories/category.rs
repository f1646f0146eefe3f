//! Category repository
//!
//! This module provides:
//! - `CategoryRepository` trait defining the interface for category data access
//! - `SqlxCategoryRepository` implementing the trait for SQLite and MySQL

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::{Category, CategoryInput, ListParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

const CATEGORY_COLUMNS: &str = "id, title, description, slug, is_published, created_at";

macro_rules! category_from_row {
    ($row:expr) => {
        Category {
            id: $row.try_get("id")?,
            title: $row.try_get("title")?,
            description: $row.try_get("description")?,
            slug: $row.try_get("slug")?,
            is_published: $row.try_get("is_published")?,
            created_at: $row.try_get("created_at")?,
        }
    };
}

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, input: &CategoryInput) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get category by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// Replace a category's editable fields
    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>>;

    /// Delete a category; posts keep existing without one
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Every category, ordered by title
    async fn list_all(&self) -> Result<Vec<Category>>;

    /// Page through categories whose title contains `search`
    async fn list(&self, search: Option<&str>, params: &ListParams) -> Result<(Vec<Category>, i64)>;

    /// Check if a slug is taken, ignoring the category `exclude_id`
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    /// Create a new SQLx category repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, input: &CategoryInput) -> Result<Category> {
        let id = with_pool!(self.pool, conn => {
            sqlx::query(
                r#"
                INSERT INTO categories (title, description, slug, is_published, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.slug)
            .bind(input.is_published)
            .bind(Utc::now())
            .execute(conn)
            .await
            .context("Failed to create category")?
            .inserted_id()
        });

        self.get_by_id(id)
            .await?
            .context("Category not found after creation")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS);
        with_pool!(self.pool, conn => {
            let row = sqlx::query(&sql)
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("Failed to get category by ID")?;
            match row {
                Some(row) => Ok(Some(category_from_row!(row))),
                None => Ok(None),
            }
        })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE slug = ?", CATEGORY_COLUMNS);
        with_pool!(self.pool, conn => {
            let row = sqlx::query(&sql)
                .bind(slug)
                .fetch_optional(conn)
                .await
                .context("Failed to get category by slug")?;
            match row {
                Some(row) => Ok(Some(category_from_row!(row))),
                None => Ok(None),
            }
        })
    }

    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>> {
        with_pool!(self.pool, conn => {
            sqlx::query(
                r#"
                UPDATE categories
                SET title = ?, description = ?, slug = ?, is_published = ?
                WHERE id = ?
                "#,
            )
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.slug)
            .bind(input.is_published)
            .bind(id)
            .execute(conn)
            .await
            .context("Failed to update category")?;
        });

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        with_pool!(self.pool, conn => {
            let result = sqlx::query("DELETE FROM categories WHERE id = ?")
                .bind(id)
                .execute(conn)
                .await
                .context("Failed to delete category")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn list_all(&self) -> Result<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories ORDER BY title ASC, id ASC",
            CATEGORY_COLUMNS
        );
        with_pool!(self.pool, conn => {
            let rows = sqlx::query(&sql)
                .fetch_all(conn)
                .await
                .context("Failed to list categories")?;
            let mut categories = Vec::with_capacity(rows.len());
            for row in rows {
                categories.push(category_from_row!(row));
            }
            Ok(categories)
        })
    }

    async fn list(
        &self,
        search: Option<&str>,
        params: &ListParams,
    ) -> Result<(Vec<Category>, i64)> {
        let pattern = format!("%{}%", search.unwrap_or(""));
        let sql = format!(
            "SELECT {} FROM categories WHERE title LIKE ? ORDER BY title ASC, id ASC LIMIT ? OFFSET ?",
            CATEGORY_COLUMNS
        );
        with_pool!(self.pool, conn => {
            let total: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE title LIKE ?")
                    .bind(&pattern)
                    .fetch_one(conn)
                    .await
                    .context("Failed to count categories")?;

            let rows = sqlx::query(&sql)
                .bind(&pattern)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(conn)
                .await
                .context("Failed to list categories")?;

            let mut categories = Vec::with_capacity(rows.len());
            for row in rows {
                categories.push(category_from_row!(row));
            }
            Ok((categories, total))
        })
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        with_pool!(self.pool, conn => {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM categories WHERE slug = ? AND id <> ?",
            )
            .bind(slug)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(conn)
            .await
            .context("Failed to check category slug")?;
            Ok(count > 0)
        })
    }
}
