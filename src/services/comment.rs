//! Comment service

use crate::db::repositories::{CommentRepository, PostRepository};
use crate::models::{Comment, CommentWithMeta, ListParams, PagedResult, User};
use anyhow::Context;
use std::sync::Arc;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// Comment not found, or it belongs to another post
    #[error("Comment not found: {0}")]
    NotFound(i64),

    /// The post being commented on does not exist
    #[error("Post not found: {0}")]
    PostNotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Comment service
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    /// Add a comment by `author` under post `post_id`
    pub async fn create(
        &self,
        post_id: i64,
        author: &User,
        text: &str,
    ) -> Result<Comment, CommentServiceError> {
        let text = validate_text(text)?;
        self.posts
            .get_by_id(post_id)
            .await
            .context("Failed to get post")?
            .ok_or(CommentServiceError::PostNotFound(post_id))?;

        let comment = self
            .comments
            .create(post_id, author.id, &text)
            .await
            .context("Failed to create comment")?;

        tracing::info!(
            comment_id = comment.id,
            post_id,
            author = %author.username,
            "comment created"
        );
        Ok(comment)
    }

    /// Get a comment addressed through its post.
    ///
    /// A comment that exists but hangs under a different post is not found.
    pub async fn get_for_post(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<CommentWithMeta, CommentServiceError> {
        self.get(comment_id)
            .await?
            .filter(|c| c.comment.post_id == post_id)
            .ok_or(CommentServiceError::NotFound(comment_id))
    }

    /// Get a comment by ID
    pub async fn get_by_id(&self, id: i64) -> Result<CommentWithMeta, CommentServiceError> {
        self.get(id)
            .await?
            .ok_or(CommentServiceError::NotFound(id))
    }

    /// Replace the text of comment `id`
    pub async fn update(
        &self,
        id: i64,
        text: &str,
    ) -> Result<CommentWithMeta, CommentServiceError> {
        let text = validate_text(text)?;
        let comment = self
            .comments
            .update_text(id, &text)
            .await
            .context("Failed to update comment")?
            .ok_or(CommentServiceError::NotFound(id))?;

        tracing::info!(comment_id = id, "comment updated");
        Ok(comment)
    }

    /// Delete exactly one comment
    pub async fn delete(&self, id: i64) -> Result<(), CommentServiceError> {
        let deleted = self
            .comments
            .delete(id)
            .await
            .context("Failed to delete comment")?;
        if !deleted {
            return Err(CommentServiceError::NotFound(id));
        }

        tracing::info!(comment_id = id, "comment deleted");
        Ok(())
    }

    /// Comments of a post, oldest first
    pub async fn list_by_post(
        &self,
        post_id: i64,
    ) -> Result<Vec<CommentWithMeta>, CommentServiceError> {
        Ok(self
            .comments
            .list_by_post(post_id)
            .await
            .context("Failed to list comments")?)
    }

    /// Staff listing, newest first
    pub async fn list(
        &self,
        search: Option<&str>,
        params: &ListParams,
    ) -> Result<PagedResult<CommentWithMeta>, CommentServiceError> {
        let (items, total) = self
            .comments
            .list(search, params)
            .await
            .context("Failed to list comments")?;
        Ok(PagedResult::new(items, total, params))
    }

    async fn get(&self, id: i64) -> Result<Option<CommentWithMeta>, CommentServiceError> {
        Ok(self
            .comments
            .get_by_id(id)
            .await
            .context("Failed to get comment")?)
    }
}

fn validate_text(text: &str) -> Result<String, CommentServiceError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CommentServiceError::ValidationError(
            "Comment cannot be empty".to_string(),
        ));
    }
    Ok(text.to_string())
}
