//! Connection pools for the two supported backends

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{DatabaseConfig, DatabaseDriver};

/// A connected database, whichever driver backs it.
///
/// Repositories branch on [`DatabasePool::driver`] and borrow the concrete
/// pool through `as_sqlite` / `as_mysql` (see the `with_pool!` macro).
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run a statement that returns no rows, yielding the affected row count
    async fn execute(&self, sql: &str) -> Result<u64>;

    fn driver(&self) -> DatabaseDriver;

    fn as_sqlite(&self) -> Option<&SqlitePool>;

    fn as_mysql(&self) -> Option<&MySqlPool>;
}

pub type DynDatabasePool = Arc<dyn DatabasePool>;

const SQLITE_MAX_CONNECTIONS: u32 = 16;
const MYSQL_MAX_CONNECTIONS: u32 = 24;

fn is_memory_url(url: &str) -> bool {
    url == ":memory:" || url.starts_with("sqlite::memory:")
}

/// Strip an optional `sqlite:` / `sqlite://` prefix from a file URL
fn sqlite_file_path(url: &str) -> &str {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
}

pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (creating if needed) the database file at `url`.
    ///
    /// `:memory:` gives a private database on one connection that is never
    /// recycled, otherwise each new connection would start with no tables.
    pub async fn connect(url: &str) -> Result<Self> {
        let (options, pool_options) = if is_memory_url(url) {
            (
                SqliteConnectOptions::from_str("sqlite::memory:")
                    .context("Invalid in-memory SQLite URL")?,
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None),
            )
        } else {
            let path = Path::new(sqlite_file_path(url));
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create database directory {:?}", dir))?;
            }
            (
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .busy_timeout(Duration::from_secs(5)),
                SqlitePoolOptions::new().max_connections(SQLITE_MAX_CONNECTIONS),
            )
        };

        // ON DELETE CASCADE / SET NULL only work with this pragma on
        let pool = pool_options
            .connect_with(options.foreign_keys(true))
            .await
            .with_context(|| format!("Failed to open SQLite database {}", url))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, sql: &str) -> Result<u64> {
        Ok(sqlx::query(sql)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute: {}", sql))?
            .rows_affected())
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        Some(&self.pool)
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        None
    }
}

pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    /// Connect to `url`; the `mysql://` scheme may be omitted
    pub async fn connect(url: &str) -> Result<Self> {
        let url = if url.starts_with("mysql://") {
            url.to_string()
        } else {
            format!("mysql://{}", url)
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(MYSQL_MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&url)
            .await
            .context("Failed to connect to MySQL")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    async fn execute(&self, sql: &str) -> Result<u64> {
        Ok(sqlx::query(sql)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute: {}", sql))?
            .rows_affected())
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        None
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        Some(&self.pool)
    }
}

/// Connect to the database named in `config`
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    Ok(match config.driver {
        DatabaseDriver::Sqlite => Arc::new(SqliteDatabase::connect(&config.url).await?),
        DatabaseDriver::Mysql => Arc::new(MysqlDatabase::connect(&config.url).await?),
    })
}

/// Empty in-memory SQLite database, without migrations
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    create_pool(&DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
    })
    .await
}
