//! Location repository

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::{ListParams, Location, LocationInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

const LOCATION_COLUMNS: &str = "id, name, is_published, created_at";

macro_rules! location_from_row {
    ($row:expr) => {
        Location {
            id: $row.try_get("id")?,
            name: $row.try_get("name")?,
            is_published: $row.try_get("is_published")?,
            created_at: $row.try_get("created_at")?,
        }
    };
}

/// Location repository trait
#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn create(&self, input: &LocationInput) -> Result<Location>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Location>>;

    async fn update(&self, id: i64, input: &LocationInput) -> Result<Option<Location>>;

    /// Delete a location; posts keep existing without one
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Every location, ordered by name
    async fn list_all(&self) -> Result<Vec<Location>>;

    /// Page through locations whose name contains `search`
    async fn list(&self, search: Option<&str>, params: &ListParams) -> Result<(Vec<Location>, i64)>;
}

/// SQLx-based location repository implementation
pub struct SqlxLocationRepository {
    pool: DynDatabasePool,
}

impl SqlxLocationRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn LocationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LocationRepository for SqlxLocationRepository {
    async fn create(&self, input: &LocationInput) -> Result<Location> {
        let id = with_pool!(self.pool, conn => {
            sqlx::query("INSERT INTO locations (name, is_published, created_at) VALUES (?, ?, ?)")
                .bind(&input.name)
                .bind(input.is_published)
                .bind(Utc::now())
                .execute(conn)
                .await
                .context("Failed to create location")?
                .inserted_id()
        });

        self.get_by_id(id)
            .await?
            .context("Location not found after creation")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Location>> {
        let sql = format!("SELECT {} FROM locations WHERE id = ?", LOCATION_COLUMNS);
        with_pool!(self.pool, conn => {
            let row = sqlx::query(&sql)
                .bind(id)
                .fetch_optional(conn)
                .await
                .context("Failed to get location by ID")?;
            match row {
                Some(row) => Ok(Some(location_from_row!(row))),
                None => Ok(None),
            }
        })
    }

    async fn update(&self, id: i64, input: &LocationInput) -> Result<Option<Location>> {
        with_pool!(self.pool, conn => {
            sqlx::query("UPDATE locations SET name = ?, is_published = ? WHERE id = ?")
                .bind(&input.name)
                .bind(input.is_published)
                .bind(id)
                .execute(conn)
                .await
                .context("Failed to update location")?;
        });

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        with_pool!(self.pool, conn => {
            let result = sqlx::query("DELETE FROM locations WHERE id = ?")
                .bind(id)
                .execute(conn)
                .await
                .context("Failed to delete location")?;
            Ok(result.rows_affected() > 0)
        })
    }

    async fn list_all(&self) -> Result<Vec<Location>> {
        let sql = format!(
            "SELECT {} FROM locations ORDER BY name ASC, id ASC",
            LOCATION_COLUMNS
        );
        with_pool!(self.pool, conn => {
            let rows = sqlx::query(&sql)
                .fetch_all(conn)
                .await
                .context("Failed to list locations")?;
            let mut locations = Vec::with_capacity(rows.len());
            for row in rows {
                locations.push(location_from_row!(row));
            }
            Ok(locations)
        })
    }

    async fn list(
        &self,
        search: Option<&str>,
        params: &ListParams,
    ) -> Result<(Vec<Location>, i64)> {
        let pattern = format!("%{}%", search.unwrap_or(""));
        let sql = format!(
            "SELECT {} FROM locations WHERE name LIKE ? ORDER BY name ASC, id ASC LIMIT ? OFFSET ?",
            LOCATION_COLUMNS
        );
        with_pool!(self.pool, conn => {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations WHERE name LIKE ?")
                .bind(&pattern)
                .fetch_one(conn)
                .await
                .context("Failed to count locations")?;

            let rows = sqlx::query(&sql)
                .bind(&pattern)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(conn)
                .await
                .context("Failed to list locations")?;

            let mut locations = Vec::with_capacity(rows.len());
            for row in rows {
                locations.push(location_from_row!(row));
            }
            Ok((locations, total))
        })
    }
}
