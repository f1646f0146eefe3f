//! Category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a category title
pub const CATEGORY_TITLE_MAX_LEN: usize = 256;

/// A thematic grouping of posts.
///
/// Unpublishing a category hides its page and every post filed under it
/// from public listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// URL identifier: latin letters, digits, hyphen and underscore
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or replacing a category
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
}
