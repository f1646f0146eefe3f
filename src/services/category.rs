//! Category service
//!
//! Implements business logic for category management:
//! - Create, read, update, delete categories (staff console)
//! - Slug format and uniqueness validation
//! - The publication gate for public category pages

use crate::db::repositories::CategoryRepository;
use crate::models::{Category, CategoryInput, ListParams, PagedResult, CATEGORY_TITLE_MAX_LEN};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Longest accepted slug
pub const SLUG_MAX_LEN: usize = 64;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern is valid"));

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Category slug already exists
    #[error("Category slug already exists: {0}")]
    DuplicateSlug(String),

    /// Category not found
    #[error("Category not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Check a slug against the accepted alphabet and length
pub fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.is_empty() {
        return Err("This field is required.".to_string());
    }
    if slug.chars().count() > SLUG_MAX_LEN {
        return Err(format!(
            "Ensure this value has at most {} characters.",
            SLUG_MAX_LEN
        ));
    }
    if !SLUG_RE.is_match(slug) {
        return Err(
            "Enter a valid slug consisting of Latin letters, numbers, underscores or hyphens."
                .to_string(),
        );
    }
    Ok(())
}

/// Category service
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    /// Create a new category service
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    /// Create a new category
    ///
    /// # Errors
    /// - `ValidationError` for an empty or over-long title or a malformed slug
    /// - `DuplicateSlug` if another category already uses the slug
    pub async fn create(&self, input: CategoryInput) -> Result<Category, CategoryServiceError> {
        let input = self.validate(input, None).await?;
        let category = self
            .repo
            .create(&input)
            .await
            .context("Failed to create category")?;

        tracing::info!(category_id = category.id, slug = %category.slug, "category created");
        Ok(category)
    }

    /// Replace the fields of category `id`
    pub async fn update(
        &self,
        id: i64,
        input: CategoryInput,
    ) -> Result<Category, CategoryServiceError> {
        self.get_by_id(id).await?;
        let input = self.validate(input, Some(id)).await?;
        let category = self
            .repo
            .update(id, &input)
            .await
            .context("Failed to update category")?
            .ok_or_else(|| CategoryServiceError::NotFound(id.to_string()))?;

        tracing::info!(category_id = id, published = category.is_published, "category updated");
        Ok(category)
    }

    /// Delete a category. Its posts stay, without a category.
    pub async fn delete(&self, id: i64) -> Result<(), CategoryServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete category")?;
        if !deleted {
            return Err(CategoryServiceError::NotFound(id.to_string()));
        }

        tracing::info!(category_id = id, "category deleted");
        Ok(())
    }

    /// Get a category by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Category, CategoryServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| CategoryServiceError::NotFound(id.to_string()))
    }

    /// Get a category for its public page.
    ///
    /// An unpublished category is reported as not found, exactly like a
    /// missing one.
    pub async fn get_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Category, CategoryServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get category by slug")?
            .filter(|category| category.is_published)
            .ok_or_else(|| CategoryServiceError::NotFound(slug.to_string()))
    }

    /// Every category, for selection lists
    pub async fn list_all(&self) -> Result<Vec<Category>, CategoryServiceError> {
        Ok(self
            .repo
            .list_all()
            .await
            .context("Failed to list categories")?)
    }

    /// Page through categories whose title contains `search`
    pub async fn list(
        &self,
        search: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<Category>, CategoryServiceError> {
        let (items, total) = self
            .repo
            .list(search, params)
            .await
            .context("Failed to list categories")?;
        Ok(PagedResult::new(items, total, params))
    }

    async fn validate(
        &self,
        input: CategoryInput,
        exclude_id: Option<i64>,
    ) -> Result<CategoryInput, CategoryServiceError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if title.chars().count() > CATEGORY_TITLE_MAX_LEN {
            return Err(CategoryServiceError::ValidationError(format!(
                "Title must be at most {} characters",
                CATEGORY_TITLE_MAX_LEN
            )));
        }

        let slug = input.slug.trim().to_string();
        validate_slug(&slug).map_err(CategoryServiceError::ValidationError)?;

        let taken = self
            .repo
            .slug_exists(&slug, exclude_id)
            .await
            .context("Failed to check slug")?;
        if taken {
            return Err(CategoryServiceError::DuplicateSlug(slug));
        }

        Ok(CategoryInput {
            title,
            description: input.description.trim().to_string(),
            slug,
            is_published: input.is_published,
        })
    }
}
