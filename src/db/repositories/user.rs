//! User repository
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, \
                            is_staff, is_active, date_joined";

macro_rules! user_from_row {
    ($row:expr) => {
        User {
            id: $row.try_get("id")?,
            username: $row.try_get("username")?,
            email: $row.try_get("email")?,
            first_name: $row.try_get("first_name")?,
            last_name: $row.try_get("last_name")?,
            password_hash: $row.try_get("password_hash")?,
            is_staff: $row.try_get("is_staff")?,
            is_active: $row.try_get("is_active")?,
            date_joined: $row.try_get("date_joined")?,
        }
    };
}

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    ///
    /// The first account stored is always staff, whatever `user.is_staff`
    /// says; the check runs inside the `INSERT`. A taken username fails with
    /// an error that [`crate::db::is_unique_violation`] recognises.
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Update profile fields, staff flags and password hash
    async fn update(&self, user: &User) -> Result<User>;

    /// Count total users
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let id = with_pool!(self.pool, conn => {
            sqlx::query(
                r#"
                INSERT INTO users (username, email, first_name, last_name, password_hash,
                                   is_staff, is_active, date_joined)
                SELECT ?, ?, ?, ?, ?, (? OR COUNT(*) = 0), ?, ? FROM users
                "#,
            )
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_hash)
            .bind(user.is_staff)
            .bind(user.is_active)
            .bind(user.date_joined)
            .execute(conn)
            .await
            .context("Failed to create user")?
            .inserted_id()
        });

        self.get_by_id(id)
            .await?
            .context("User not found after creation")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        with_pool!(self.pool, conn => {
            let row = sqlx::query(&sql)
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("Failed to get user by ID")?;
            match row {
                Some(row) => Ok(Some(user_from_row!(row))),
                None => Ok(None),
            }
        })
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        with_pool!(self.pool, conn => {
            let row = sqlx::query(&sql)
                .bind(username)
                .fetch_optional(conn)
                .await
                .context("Failed to get user by username")?;
            match row {
                Some(row) => Ok(Some(user_from_row!(row))),
                None => Ok(None),
            }
        })
    }

    async fn update(&self, user: &User) -> Result<User> {
        with_pool!(self.pool, conn => {
            sqlx::query(
                r#"
                UPDATE users
                SET username = ?, email = ?, first_name = ?, last_name = ?,
                    password_hash = ?, is_staff = ?, is_active = ?
                WHERE id = ?
                "#,
            )
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_hash)
            .bind(user.is_staff)
            .bind(user.is_active)
            .bind(user.id)
            .execute(conn)
            .await
            .context("Failed to update user")?;
        });

        self.get_by_id(user.id)
            .await?
            .context("User not found after update")
    }

    async fn count(&self) -> Result<i64> {
        with_pool!(self.pool, conn => {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(conn)
                .await
                .context("Failed to count users")?;
            Ok(count)
        })
    }
}
