//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
    pub author_id: i64,
}

/// Comment with the fields needed to render it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithMeta {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_username: String,
    pub post_title: String,
}
