//! Web middleware and request extractors
//!
//! Contains:
//! - Session cookie handling and the current-user loader
//! - The error page renderer
//! - `MaybeUser`, `AuthenticatedUser` and `StaffUser` extractors

use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use std::convert::Infallible;

use super::error::{ErrorPage, WebError};
use super::{base_context, AppState};
use crate::models::User;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "sessionid";

/// The logged-in user, stored in request extensions by [`load_current_user`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Session token the current user was authenticated with
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Extract the session token from the Cookie header
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().strip_prefix("sessionid="))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// `Set-Cookie` value installing a session token
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> HeaderValue {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| clear_session_cookie(secure))
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("sessionid=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure")
    } else {
        HeaderValue::from_static("sessionid=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

/// Resolve the session cookie to a user for every request.
///
/// Requests without a valid session continue anonymously.
pub async fn load_current_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = session_token(request.headers()) {
        match state.user_service.validate_session(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(CurrentUser(user));
                request.extensions_mut().insert(SessionToken(token));
            }
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "session validation failed"),
        }
    }
    next.run(request).await
}

/// Replace bodies of responses marked with [`ErrorPage`] by the HTML page
/// for their status.
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .map(|current| current.0.clone());

    let response = next.run(request).await;
    let Some(ErrorPage(status)) = response.extensions().get::<ErrorPage>().copied() else {
        return response;
    };

    let template = format!("pages/{}.html", status.as_u16());
    let context = base_context(user.as_ref());
    match state.templates.render(&template, &context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, status = status.as_u16(), "failed to render error page");
            response
        }
    }
}

/// The visitor, logged in or not
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn as_ref(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<CurrentUser>()
                .map(|current| current.0.clone()),
        ))
    }
}

/// A logged-in user; anonymous visitors are sent to the login page
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .map(|current| Self(current.0.clone()))
            .ok_or_else(|| WebError::LoginRequired {
                next: requested_path(parts),
            })
    }
}

/// A logged-in staff user; other users get the forbidden page
#[derive(Debug, Clone)]
pub struct StaffUser(pub User);

impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        if user.is_staff {
            Ok(Self(user))
        } else {
            Err(WebError::Forbidden)
        }
    }
}

/// Path parameters whose failure to parse means the page does not exist
#[derive(Debug)]
pub struct PathParams<T>(pub T);

impl<S, T> FromRequestParts<S> for PathParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(|_| WebError::NotFound)
    }
}

fn requested_path(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string())
}
