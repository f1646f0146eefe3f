//! Database layer
//!
//! SQLite is the default backend; MySQL is selected through configuration.
//! Both are reached through the [`DatabasePool`] trait so repositories never
//! depend on a concrete driver.
//!
//! # Usage
//!
//! ```ignore
//! use blogicum::config::DatabaseConfig;
//! use blogicum::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

/// Run `$body` against the concrete pool behind a [`DynDatabasePool`].
///
/// The body is expanded once per driver with `$conn` bound to a `&SqlitePool`
/// or a `&MySqlPool`, so the same query text serves both backends.
macro_rules! with_pool {
    ($pool:expr, $conn:ident => $body:expr) => {
        match $pool.driver() {
            $crate::config::DatabaseDriver::Sqlite => {
                let $conn = $pool
                    .as_sqlite()
                    .ok_or_else(|| ::anyhow::anyhow!("SQLite pool is not available"))?;
                $body
            }
            $crate::config::DatabaseDriver::Mysql => {
                let $conn = $pool
                    .as_mysql()
                    .ok_or_else(|| ::anyhow::anyhow!("MySQL pool is not available"))?;
                $body
            }
        }
    };
}

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

/// Whether `err` comes from a UNIQUE constraint rejecting a row
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db)) if db.is_unique_violation()
    )
}

/// Uniform access to the id generated by an `INSERT`.
pub(crate) trait LastInsertId {
    fn inserted_id(&self) -> i64;
}

impl LastInsertId for sqlx::sqlite::SqliteQueryResult {
    fn inserted_id(&self) -> i64 {
        self.last_insert_rowid()
    }
}

impl LastInsertId for sqlx::mysql::MySqlQueryResult {
    fn inserted_id(&self) -> i64 {
        self.last_insert_id() as i64
    }
}
