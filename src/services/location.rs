//! Location service

use crate::db::repositories::LocationRepository;
use crate::models::{ListParams, Location, LocationInput, PagedResult, LOCATION_NAME_MAX_LEN};
use anyhow::Context;
use std::sync::Arc;

/// Error types for location service operations
#[derive(Debug, thiserror::Error)]
pub enum LocationServiceError {
    #[error("Location not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Location service
pub struct LocationService {
    repo: Arc<dyn LocationRepository>,
}

impl LocationService {
    pub fn new(repo: Arc<dyn LocationRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: LocationInput) -> Result<Location, LocationServiceError> {
        let input = validate(input)?;
        let location = self
            .repo
            .create(&input)
            .await
            .context("Failed to create location")?;

        tracing::info!(location_id = location.id, "location created");
        Ok(location)
    }

    pub async fn update(
        &self,
        id: i64,
        input: LocationInput,
    ) -> Result<Location, LocationServiceError> {
        let input = validate(input)?;
        let location = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update location")?
            .ok_or(LocationServiceError::NotFound(id))?;

        tracing::info!(location_id = id, "location updated");
        Ok(location)
    }

    /// Delete a location. Its posts stay, without a location.
    pub async fn delete(&self, id: i64) -> Result<(), LocationServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete location")?;
        if !deleted {
            return Err(LocationServiceError::NotFound(id));
        }

        tracing::info!(location_id = id, "location deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Location, LocationServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get location")?
            .ok_or(LocationServiceError::NotFound(id))
    }

    pub async fn list_all(&self) -> Result<Vec<Location>, LocationServiceError> {
        Ok(self
            .repo
            .list_all()
            .await
            .context("Failed to list locations")?)
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<Location>, LocationServiceError> {
        let (items, total) = self
            .repo
            .list(search, params)
            .await
            .context("Failed to list locations")?;
        Ok(PagedResult::new(items, total, params))
    }
}

fn validate(input: LocationInput) -> Result<LocationInput, LocationServiceError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(LocationServiceError::ValidationError(
            "Name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() > LOCATION_NAME_MAX_LEN {
        return Err(LocationServiceError::ValidationError(format!(
            "Name must be at most {} characters",
            LOCATION_NAME_MAX_LEN
        )));
    }
    Ok(LocationInput {
        name,
        is_published: input.is_published,
    })
}
