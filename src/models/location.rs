//! Location model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a location name
pub const LOCATION_NAME_MAX_LEN: usize = 256;

/// A place a post can be attached to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or replacing a location
#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    pub name: String,
    pub is_published: bool,
}
