//! Post service
//!
//! Business logic for posts:
//! - Create, update and delete posts with field validation
//! - Detail retrieval honouring the visibility rule and author previews
//! - Public, category, profile and staff listings

use crate::db::repositories::{CategoryRepository, LocationRepository, PostRepository};
use crate::models::{
    ListParams, PagedResult, Post, PostFilter, PostInput, PostScope, PostWithMeta, User,
    POST_TITLE_MAX_LEN,
};
use crate::services::access;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Post not found, or hidden from the viewer
    #[error("Post not found: {0}")]
    NotFound(i64),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Staff listing filter on the visibility rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationFilter {
    Published,
    NotPublished,
}

impl PublicationFilter {
    /// Parse the `is_published` query value of the staff post list
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "published" => Some(Self::Published),
            "not_published" => Some(Self::NotPublished),
            _ => None,
        }
    }

    fn scope(self, now: DateTime<Utc>) -> PostScope {
        match self {
            Self::Published => PostScope::Visible(now),
            Self::NotPublished => PostScope::Hidden(now),
        }
    }
}

/// Post service
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    categories: Arc<dyn CategoryRepository>,
    locations: Arc<dyn LocationRepository>,
}

impl PostService {
    /// Create a new post service
    pub fn new(
        posts: Arc<dyn PostRepository>,
        categories: Arc<dyn CategoryRepository>,
        locations: Arc<dyn LocationRepository>,
    ) -> Self {
        Self {
            posts,
            categories,
            locations,
        }
    }

    /// Create a post written by `author`
    pub async fn create(&self, author: &User, input: PostInput) -> Result<Post, PostServiceError> {
        let input = self.validate(input).await?;
        let post = self
            .posts
            .create(author.id, &input)
            .await
            .context("Failed to create post")?;

        tracing::info!(
            post_id = post.id,
            author = %author.username,
            scheduled = post.is_scheduled(Utc::now()),
            "post created"
        );
        Ok(post)
    }

    /// Get a post regardless of visibility
    pub async fn get(&self, id: i64) -> Result<PostWithMeta, PostServiceError> {
        self.posts
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or(PostServiceError::NotFound(id))
    }

    /// Get a post for its detail page.
    ///
    /// Hidden posts are reported as not found unless `viewer` wrote them.
    pub async fn get_for_viewer(
        &self,
        id: i64,
        viewer: Option<&User>,
        now: DateTime<Utc>,
    ) -> Result<PostWithMeta, PostServiceError> {
        let post = self.get(id).await?;
        access::visible_posts_for(viewer, [post], now)
            .pop()
            .ok_or(PostServiceError::NotFound(id))
    }

    /// Replace the editable fields of post `id`
    pub async fn update(&self, id: i64, input: PostInput) -> Result<Post, PostServiceError> {
        let input = self.validate(input).await?;
        let post = self
            .posts
            .update(id, &input)
            .await
            .context("Failed to update post")?
            .ok_or(PostServiceError::NotFound(id))?;

        tracing::info!(post_id = id, published = post.is_published, "post updated");
        Ok(post)
    }

    /// Delete a post together with its comments
    pub async fn delete(&self, id: i64) -> Result<(), PostServiceError> {
        let deleted = self
            .posts
            .delete(id)
            .await
            .context("Failed to delete post")?;
        if !deleted {
            return Err(PostServiceError::NotFound(id));
        }

        tracing::info!(post_id = id, "post deleted");
        Ok(())
    }

    /// Visible posts for the front page
    pub async fn list_index(
        &self,
        params: &ListParams,
        now: DateTime<Utc>,
    ) -> Result<PagedResult<PostWithMeta>, PostServiceError> {
        self.list(&PostFilter::visible(now), params).await
    }

    /// Visible posts of a category that already passed the publication gate
    pub async fn list_category(
        &self,
        category_id: i64,
        params: &ListParams,
        now: DateTime<Utc>,
    ) -> Result<PagedResult<PostWithMeta>, PostServiceError> {
        self.list(&PostFilter::visible(now).in_category(category_id), params)
            .await
    }

    /// Posts of `owner` as listed on their profile page to `viewer`
    pub async fn list_profile(
        &self,
        owner: &User,
        viewer: Option<&User>,
        params: &ListParams,
        now: DateTime<Utc>,
    ) -> Result<PagedResult<PostWithMeta>, PostServiceError> {
        let filter = PostFilter {
            scope: access::profile_scope(viewer, owner.id, now),
            ..PostFilter::all()
        }
        .by_author(owner.id);
        self.list(&filter, params).await
    }

    /// Staff listing with optional publication filter and search
    pub async fn list_admin(
        &self,
        publication: Option<PublicationFilter>,
        search: Option<String>,
        params: &ListParams,
        now: DateTime<Utc>,
    ) -> Result<PagedResult<PostWithMeta>, PostServiceError> {
        let filter = PostFilter {
            scope: publication.map_or(PostScope::All, |p| p.scope(now)),
            ..PostFilter::all()
        }
        .matching(search);
        self.list(&filter, params).await
    }

    /// Number of posts stored
    pub async fn count(&self) -> Result<i64, PostServiceError> {
        Ok(self
            .posts
            .count(&PostFilter::all())
            .await
            .context("Failed to count posts")?)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        params: &ListParams,
    ) -> Result<PagedResult<PostWithMeta>, PostServiceError> {
        let (items, total) = self
            .posts
            .list(filter, params)
            .await
            .context("Failed to list posts")?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Check `input` and the category and location it points at
    pub async fn validate(&self, input: PostInput) -> Result<PostInput, PostServiceError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(PostServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if title.chars().count() > POST_TITLE_MAX_LEN {
            return Err(PostServiceError::ValidationError(format!(
                "Title must be at most {} characters",
                POST_TITLE_MAX_LEN
            )));
        }
        if input.text.trim().is_empty() {
            return Err(PostServiceError::ValidationError(
                "Text cannot be empty".to_string(),
            ));
        }

        if let Some(category_id) = input.category_id {
            let exists = self
                .categories
                .get_by_id(category_id)
                .await
                .context("Failed to check category")?
                .is_some();
            if !exists {
                return Err(PostServiceError::ValidationError(format!(
                    "Category {} does not exist",
                    category_id
                )));
            }
        }
        if let Some(location_id) = input.location_id {
            let exists = self
                .locations
                .get_by_id(location_id)
                .await
                .context("Failed to check location")?
                .is_some();
            if !exists {
                return Err(PostServiceError::ValidationError(format!(
                    "Location {} does not exist",
                    location_id
                )));
            }
        }

        Ok(PostInput { title, ..input })
    }
}
