//! Handler errors
//!
//! Every handler failure becomes a `WebError`. Its response carries an
//! [`ErrorPage`] marker which `middleware::render_error_pages` replaces with
//! the matching HTML page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::services::{
    CategoryServiceError, CommentServiceError, LocationServiceError, MediaError, PostServiceError,
    UserServiceError,
};
use crate::templates::TemplateError;

/// Response extension asking for the error page of the given status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPage(pub StatusCode);

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    /// Anonymous visitor on a login-required page
    #[error("login required for {next}")]
    LoginRequired { next: String },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::LoginRequired { .. } => StatusCode::SEE_OTHER,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Login page URL that brings the visitor back to `next` afterwards
pub fn login_url(next: &str) -> String {
    format!("/auth/login/?next={}", urlencoding::encode(next))
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::LoginRequired { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::BadRequest(message) => (status, message).into_response(),
            Self::Internal(error) => {
                tracing::error!(error = ?error, "request failed");
                with_error_page(status)
            }
            Self::NotFound | Self::Forbidden => with_error_page(status),
        }
    }
}

fn with_error_page(status: StatusCode) -> Response {
    let mut response = status.into_response();
    response.extensions_mut().insert(ErrorPage(status));
    response
}

impl From<TemplateError> for WebError {
    fn from(error: TemplateError) -> Self {
        Self::Internal(error.into())
    }
}

impl From<PostServiceError> for WebError {
    fn from(error: PostServiceError) -> Self {
        match error {
            PostServiceError::NotFound(_) => Self::NotFound,
            PostServiceError::ValidationError(message) => Self::BadRequest(message),
            PostServiceError::InternalError(e) => Self::Internal(e),
        }
    }
}

impl From<CommentServiceError> for WebError {
    fn from(error: CommentServiceError) -> Self {
        match error {
            CommentServiceError::NotFound(_) | CommentServiceError::PostNotFound(_) => {
                Self::NotFound
            }
            CommentServiceError::ValidationError(message) => Self::BadRequest(message),
            CommentServiceError::InternalError(e) => Self::Internal(e),
        }
    }
}

impl From<CategoryServiceError> for WebError {
    fn from(error: CategoryServiceError) -> Self {
        match error {
            CategoryServiceError::NotFound(_) => Self::NotFound,
            CategoryServiceError::ValidationError(message)
            | CategoryServiceError::DuplicateSlug(message) => Self::BadRequest(message),
            CategoryServiceError::InternalError(e) => Self::Internal(e),
        }
    }
}

impl From<LocationServiceError> for WebError {
    fn from(error: LocationServiceError) -> Self {
        match error {
            LocationServiceError::NotFound(_) => Self::NotFound,
            LocationServiceError::ValidationError(message) => Self::BadRequest(message),
            LocationServiceError::InternalError(e) => Self::Internal(e),
        }
    }
}

impl From<UserServiceError> for WebError {
    fn from(error: UserServiceError) -> Self {
        match error {
            UserServiceError::AuthenticationError(message)
            | UserServiceError::ValidationError(message)
            | UserServiceError::UserExists(message) => Self::BadRequest(message),
            UserServiceError::InternalError(e) => Self::Internal(e),
        }
    }
}

impl From<MediaError> for WebError {
    fn from(error: MediaError) -> Self {
        match error {
            MediaError::Io(e) => Self::Internal(e.into()),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn test_error_page_marker() {
        let response = WebError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.extensions().get::<ErrorPage>(),
            Some(&ErrorPage(StatusCode::NOT_FOUND))
        );

        let response = WebError::Internal(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<ErrorPage>().is_some());
    }

    #[test]
    fn test_login_redirect_keeps_next() {
        let response = WebError::LoginRequired {
            next: "/posts/create/".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=%2Fposts%2Fcreate%2F"
        );
    }

    #[test]
    fn test_service_errors_map_to_statuses() {
        assert_eq!(
            WebError::from(PostServiceError::NotFound(1)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WebError::from(CategoryServiceError::NotFound("x".to_string())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WebError::from(CommentServiceError::ValidationError("x".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
