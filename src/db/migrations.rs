//! Embedded schema migrations
//!
//! Every migration carries one script per backend. The versions already
//! applied to a database are kept in `_migrations`; `run_migrations` applies
//! the rest in order.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::BTreeSet;

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    pub sqlite: &'static str,
    pub mysql: &'static str,
}

impl Migration {
    /// The script for `driver`, split into individual statements
    fn statements(&self, driver: DatabaseDriver) -> Vec<&'static str> {
        let script = match driver {
            DatabaseDriver::Sqlite => self.sqlite,
            DatabaseDriver::Mysql => self.mysql,
        };
        script
            .split(';')
            .map(str::trim)
            .filter(|stmt| {
                stmt.lines()
                    .map(str::trim)
                    .any(|line| !line.is_empty() && !line.starts_with("--"))
            })
            .collect()
    }
}

/// All schema migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                email VARCHAR(254) NOT NULL DEFAULT '',
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                password_hash VARCHAR(255) NOT NULL,
                is_staff BOOLEAN NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                date_joined TIMESTAMP NOT NULL
            );
        "#,
        mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(150) NOT NULL UNIQUE,
                email VARCHAR(254) NOT NULL DEFAULT '',
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                password_hash VARCHAR(255) NOT NULL,
                is_staff BOOLEAN NOT NULL DEFAULT FALSE,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                date_joined DATETIME NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_sessions",
        sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id BIGINT NOT NULL,
                expires_at DATETIME NOT NULL,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_categories",
        sqlite: r#"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(256) NOT NULL,
                description TEXT NOT NULL,
                slug VARCHAR(64) NOT NULL UNIQUE,
                is_published BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL
            );
        "#,
        mysql: r#"
            CREATE TABLE IF NOT EXISTS categories (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(256) NOT NULL,
                description TEXT NOT NULL,
                slug VARCHAR(64) NOT NULL UNIQUE,
                is_published BOOLEAN NOT NULL DEFAULT TRUE,
                created_at DATETIME NOT NULL
            );
        "#,
    },
    Migration {
        version: 4,
        name: "create_locations",
        sqlite: r#"
            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(256) NOT NULL,
                is_published BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL
            );
        "#,
        mysql: r#"
            CREATE TABLE IF NOT EXISTS locations (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(256) NOT NULL,
                is_published BOOLEAN NOT NULL DEFAULT TRUE,
                created_at DATETIME NOT NULL
            );
        "#,
    },
    Migration {
        version: 5,
        name: "create_posts",
        sqlite: r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(256) NOT NULL,
                text TEXT NOT NULL,
                pub_date TIMESTAMP NOT NULL,
                is_published BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL,
                author_id INTEGER NOT NULL,
                category_id INTEGER,
                location_id INTEGER,
                image VARCHAR(255),
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL,
                FOREIGN KEY (location_id) REFERENCES locations(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_posts_pub_date ON posts(pub_date);
            CREATE INDEX IF NOT EXISTS idx_posts_author_id ON posts(author_id);
            CREATE INDEX IF NOT EXISTS idx_posts_category_id ON posts(category_id);
        "#,
        mysql: r#"
            CREATE TABLE IF NOT EXISTS posts (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(256) NOT NULL,
                text TEXT NOT NULL,
                pub_date DATETIME(6) NOT NULL,
                is_published BOOLEAN NOT NULL DEFAULT TRUE,
                created_at DATETIME(6) NOT NULL,
                author_id BIGINT NOT NULL,
                category_id BIGINT NULL,
                location_id BIGINT NULL,
                image VARCHAR(255) NULL,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL,
                FOREIGN KEY (location_id) REFERENCES locations(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_posts_pub_date ON posts(pub_date);
        "#,
    },
    Migration {
        version: 6,
        name: "create_comments",
        sqlite: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL,
                post_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments(post_id);
        "#,
        mysql: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                text TEXT NOT NULL,
                created_at DATETIME(6) NOT NULL,
                post_id BIGINT NOT NULL,
                author_id BIGINT NOT NULL,
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
            );
        "#,
    },
];

const TRACKING_TABLE_SQLITE: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    version INTEGER PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    applied_at TIMESTAMP NOT NULL
)";

const TRACKING_TABLE_MYSQL: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    version INT PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    applied_at DATETIME NOT NULL
)";

async fn applied_versions(pool: &DynDatabasePool) -> Result<BTreeSet<i32>> {
    pool.execute(match pool.driver() {
        DatabaseDriver::Sqlite => TRACKING_TABLE_SQLITE,
        DatabaseDriver::Mysql => TRACKING_TABLE_MYSQL,
    })
    .await?;

    let versions: Vec<i32> = with_pool!(pool, conn => {
        sqlx::query_scalar("SELECT version FROM _migrations")
            .fetch_all(conn)
            .await
            .context("Failed to read applied migrations")?
    });
    Ok(versions.into_iter().collect())
}

fn pending(applied: &BTreeSet<i32>) -> impl Iterator<Item = &'static Migration> + '_ {
    MIGRATIONS
        .iter()
        .filter(move |migration| !applied.contains(&migration.version))
}

/// Number of migrations not yet applied
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    let applied = applied_versions(pool).await?;
    Ok(pending(&applied).count())
}

/// Apply every pending migration, returning how many ran
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    let applied = applied_versions(pool).await?;
    let driver = pool.driver();

    let mut count = 0;
    for migration in pending(&applied) {
        tracing::info!(version = migration.version, name = migration.name, "Applying migration");
        for statement in migration.statements(driver) {
            pool.execute(statement)
                .await
                .with_context(|| format!("Migration {} failed", migration.name))?;
        }
        with_pool!(pool, conn => {
            sqlx::query("INSERT INTO _migrations (version, name, applied_at) VALUES (?, ?, ?)")
                .bind(migration.version)
                .bind(migration.name)
                .bind(Utc::now())
                .execute(conn)
                .await
                .with_context(|| format!("Failed to record migration {}", migration.name))?;
        });
        count += 1;
    }

    if count == 0 {
        tracing::debug!("Schema is up to date");
    }
    Ok(count)
}
