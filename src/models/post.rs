//! Post model
//!
//! A post is publicly visible only while it is published, its publication
//! date has arrived and its category (if any) is published. Posts with a
//! future `pub_date` are scheduled: their author can already see them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a post title
pub const POST_TITLE_MAX_LEN: usize = 256;

/// Posts shown per page on public listings
pub const POSTS_PER_PAGE: u32 = 10;

/// Post row as stored in the `posts` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// Publication moment; a future value schedules the post
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    /// Path of the uploaded image relative to the media root
    pub image: Option<String>,
}

impl Post {
    /// Whether the post is scheduled for a later moment than `now`
    pub fn is_scheduled(&self, now: DateTime<Utc>) -> bool {
        self.pub_date > now
    }
}

/// The slice of a category needed to render and filter a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostCategory {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub is_published: bool,
}

/// The slice of a location needed to render a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostLocation {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
}

/// Post joined with its author, category, location and comment count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWithMeta {
    #[serde(flatten)]
    pub post: Post,
    pub author_username: String,
    pub category: Option<PostCategory>,
    pub location: Option<PostLocation>,
    pub comment_count: i64,
}

/// Input for creating or replacing a post
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub image: Option<String>,
}

impl PostInput {
    /// Start from an existing post so callers only override what changed
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date,
            is_published: post.is_published,
            category_id: post.category_id,
            location_id: post.location_id,
            image: post.image.clone(),
        }
    }
}

/// Which posts a listing should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    /// Every post, visible or not
    All,
    /// Only posts passing the visibility rule at the given moment
    Visible(DateTime<Utc>),
    /// Only posts failing the visibility rule at the given moment
    Hidden(DateTime<Utc>),
}

/// Listing filter for post queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFilter {
    pub scope: PostScope,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    /// Case-insensitive title match, or exact id when numeric
    pub search: Option<String>,
}

impl PostFilter {
    /// Every post
    pub fn all() -> Self {
        Self {
            scope: PostScope::All,
            author_id: None,
            category_id: None,
            search: None,
        }
    }

    /// Posts visible to the public at `now`
    pub fn visible(now: DateTime<Utc>) -> Self {
        Self {
            scope: PostScope::Visible(now),
            ..Self::all()
        }
    }

    pub fn by_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn matching(mut self, search: Option<String>) -> Self {
        self.search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }
}
