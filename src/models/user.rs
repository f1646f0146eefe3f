//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account.
///
/// Staff users may enter the administration console; everyone else can only
/// manage their own posts, comments and profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Login name (unique)
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Create a new User. The password must already be hashed.
    pub fn new(username: String, password_hash: String, is_staff: bool) -> Self {
        Self {
            id: 0, // Will be set by the database
            username,
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash,
            is_staff,
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    /// "First Last", or an empty string when neither is set
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Fields a user may change on their own profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}
