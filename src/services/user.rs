//! User service
//!
//! Registration, login sessions, profile edits and password changes.
//! The first account ever registered becomes staff.

use crate::db::{self, repositories::{SessionRepository, UserRepository}};
use crate::models::{Session, UpdateProfileInput, User};
use crate::services::password::{hash_password, password_problems, verify_password};
use anyhow::Context;
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 14;

/// Longest accepted username
pub const USERNAME_MAX_LEN: usize = 150;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Username already taken
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Check a username against the accepted alphabet and length
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("This field is required.".to_string());
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(format!(
            "Ensure this value has at most {} characters.",
            USERNAME_MAX_LEN
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        );
    }
    Ok(())
}

/// Check an optional email address; empty is accepted
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() || EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err("Enter a valid email address.".to_string())
    }
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    /// Create a new user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// - `ValidationError` for a malformed username or a weak password
    /// - `UserExists` if the username is already taken
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let username = input.username.trim().to_string();
        validate_username(&username).map_err(UserServiceError::ValidationError)?;

        let problems = password_problems(&input.password, &username);
        if !problems.is_empty() {
            return Err(UserServiceError::ValidationError(problems.join(" ")));
        }

        if self.get_by_username(&username).await?.is_some() {
            return Err(UserServiceError::UserExists(username));
        }

        let password_hash = hash_password(&input.password)?;
        let user = match self
            .user_repo
            .create(&User::new(username.clone(), password_hash, false))
            .await
        {
            Ok(user) => user,
            // lost a race with another registration of the same name
            Err(e) if db::is_unique_violation(&e) => {
                return Err(UserServiceError::UserExists(username))
            }
            Err(e) => return Err(e.context("Failed to create user").into()),
        };

        tracing::info!(
            user_id = user.id,
            username = %user.username,
            staff = user.is_staff,
            "user registered"
        );
        Ok(user)
    }

    /// Check credentials and open a new session
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let invalid = || {
            UserServiceError::AuthenticationError(
                "Please enter a correct username and password. Note that both fields may be case-sensitive."
                    .to_string(),
            )
        };

        let Some(user) = self.get_by_username(input.username.trim()).await? else {
            tracing::warn!(username = %input.username, "login failed: unknown user");
            return Err(invalid());
        };

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !password_valid {
            tracing::warn!(user_id = user.id, "login failed: wrong password");
            return Err(invalid());
        }

        if !user.is_active {
            tracing::warn!(user_id = user.id, "login failed: inactive account");
            return Err(UserServiceError::AuthenticationError(
                "This account is inactive.".to_string(),
            ));
        }

        let session = self.create_session(user.id).await?;
        tracing::info!(user_id = user.id, "user logged in");
        Ok(session)
    }

    /// Invalidate a session; unknown tokens are ignored
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Expired sessions are removed and treated as absent.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let Some(session) = self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        else {
            return Ok(None);
        };

        if session.is_expired() {
            self.session_repo
                .delete(token)
                .await
                .context("Failed to delete expired session")?;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user.filter(|u| u.is_active))
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?;
        Ok(user)
    }

    /// Total number of accounts
    pub async fn count(&self) -> Result<i64, UserServiceError> {
        Ok(self.user_repo.count().await.context("Failed to count users")?)
    }

    /// Update the profile fields of `user`
    pub async fn update_profile(
        &self,
        user: &User,
        input: UpdateProfileInput,
    ) -> Result<User, UserServiceError> {
        let username = input.username.trim().to_string();
        validate_username(&username).map_err(UserServiceError::ValidationError)?;
        let email = input.email.trim().to_string();
        validate_email(&email).map_err(UserServiceError::ValidationError)?;

        if username != user.username {
            if let Some(existing) = self.get_by_username(&username).await? {
                if existing.id != user.id {
                    return Err(UserServiceError::UserExists(username));
                }
            }
        }

        let mut updated = user.clone();
        updated.username = username;
        updated.email = email;
        updated.first_name = input.first_name.trim().to_string();
        updated.last_name = input.last_name.trim().to_string();

        let saved = match self.user_repo.update(&updated).await {
            Ok(saved) => saved,
            Err(e) if db::is_unique_violation(&e) => {
                return Err(UserServiceError::UserExists(updated.username))
            }
            Err(e) => return Err(e.context("Failed to update profile").into()),
        };
        tracing::info!(user_id = saved.id, "profile updated");
        Ok(saved)
    }

    /// Replace the password of `user`.
    ///
    /// Every existing session of the user is closed and a fresh one is
    /// returned for the caller to keep.
    pub async fn change_password(
        &self,
        user: &User,
        old_password: &str,
        new_password: &str,
    ) -> Result<Session, UserServiceError> {
        let old_valid = verify_password(old_password, &user.password_hash)
            .context("Failed to verify password")?;
        if !old_valid {
            return Err(UserServiceError::AuthenticationError(
                "Your old password was entered incorrectly. Please enter it again.".to_string(),
            ));
        }

        let problems = password_problems(new_password, &user.username);
        if !problems.is_empty() {
            return Err(UserServiceError::ValidationError(problems.join(" ")));
        }

        let mut updated = user.clone();
        updated.password_hash = hash_password(new_password)?;
        self.user_repo
            .update(&updated)
            .await
            .context("Failed to update password")?;

        self.session_repo
            .delete_by_user(user.id)
            .await
            .context("Failed to close old sessions")?;
        tracing::info!(user_id = user.id, "password changed");

        self.create_session(user.id).await
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired(Utc::now())
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }

    /// Create a new session for a user
    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().simple().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }
}
