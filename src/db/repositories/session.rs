//! Session repository
//!
//! Database operations for login sessions.

use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (token)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all sessions for a user
    async fn delete_by_user(&self, user_id: i64) -> Result<()>;

    /// Delete sessions that expired before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// SQLx-based session repository implementation
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        with_pool!(self.pool, conn => {
            sqlx::query(
                "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&session.id)
            .bind(session.user_id)
            .bind(session.expires_at)
            .bind(session.created_at)
            .execute(conn)
            .await
            .context("Failed to create session")?;
        });

        Ok(session.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        with_pool!(self.pool, conn => {
            let row = sqlx::query(
                "SELECT id, user_id, expires_at, created_at FROM sessions WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(conn)
            .await
            .context("Failed to get session by ID")?;

            match row {
                Some(row) => Ok(Some(Session {
                    id: row.try_get("id")?,
                    user_id: row.try_get("user_id")?,
                    expires_at: row.try_get("expires_at")?,
                    created_at: row.try_get("created_at")?,
                })),
                None => Ok(None),
            }
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        with_pool!(self.pool, conn => {
            sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(id)
                .execute(conn)
                .await
                .context("Failed to delete session")?;
        });
        Ok(())
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<()> {
        with_pool!(self.pool, conn => {
            sqlx::query("DELETE FROM sessions WHERE user_id = ?")
                .bind(user_id)
                .execute(conn)
                .await
                .context("Failed to delete sessions by user")?;
        });
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        with_pool!(self.pool, conn => {
            let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
                .bind(now)
                .execute(conn)
                .await
                .context("Failed to delete expired sessions")?;
            Ok(result.rows_affected())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;
    use chrono::Duration;

    async fn setup() -> (Arc<dyn SessionRepository>, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let user = SqlxUserRepository::new(pool.clone())
            .create(&User::new("reader".to_string(), "hash".to_string(), false))
            .await
            .unwrap();
        (SqlxSessionRepository::boxed(pool), user.id)
    }

    fn session(id: &str, user_id: i64, expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            id: id.to_string(),
            user_id,
            expires_at: now + expires_in,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let (repo, user_id) = setup().await;

        repo.create(&session("token-1", user_id, Duration::days(1)))
            .await
            .unwrap();
        let found = repo.get_by_id("token-1").await.unwrap().unwrap();
        assert_eq!(found.user_id, user_id);

        repo.delete("token-1").await.unwrap();
        assert!(repo.get_by_id("token-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_expired_keeps_live_sessions() {
        let (repo, user_id) = setup().await;

        repo.create(&session("old", user_id, Duration::days(-1)))
            .await
            .unwrap();
        repo.create(&session("live", user_id, Duration::days(1)))
            .await
            .unwrap();

        let removed = repo.delete_expired(Utc::now()).await.unwrap();
        assert_eq!(removed, 1);
        assert!(repo.get_by_id("live").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_by_user() {
        let (repo, user_id) = setup().await;

        repo.create(&session("a", user_id, Duration::days(1))).await.unwrap();
        repo.create(&session("b", user_id, Duration::days(1))).await.unwrap();
        repo.delete_by_user(user_id).await.unwrap();

        assert!(repo.get_by_id("a").await.unwrap().is_none());
        assert!(repo.get_by_id("b").await.unwrap().is_none());
    }
}
