//! Registration, login, logout and password change

use axum::{
    extract::{Form, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;

use super::error::WebError;
use super::forms::{FormErrors, LoginForm, PasswordChangeForm, RegistrationForm};
use super::middleware::{clear_session_cookie, session_cookie, AuthenticatedUser, SessionToken};
use super::{base_context, AppState};
use crate::models::User;
use crate::services::{LoginInput, RegisterInput, UserServiceError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/auth/registration/",
            get(registration_page).post(register),
        )
        .route("/auth/login/", get(login_page).post(login))
        .route("/auth/logout/", post(logout))
        .route(
            "/auth/password_change/",
            get(password_change_page).post(password_change),
        )
        .route("/auth/password_change/done/", get(password_change_done))
}

/// Where to go after login: `next` when it is a local path, `/` otherwise
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => "/",
    }
}

#[derive(Debug, Default, Deserialize)]
struct NextQuery {
    next: Option<String>,
}

fn render_registration(
    state: &AppState,
    username: &str,
    errors: &FormErrors,
) -> Result<Response, WebError> {
    let mut context = base_context(None);
    context.insert("username", username);
    context.insert("errors", errors);
    Ok(state
        .render("registration/registration_form.html", &context)?
        .into_response())
}

/// GET /auth/registration/
async fn registration_page(State(state): State<AppState>) -> Result<Response, WebError> {
    render_registration(&state, "", &FormErrors::new())
}

/// POST /auth/registration/
async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, WebError> {
    if let Err(errors) = form.validate() {
        return render_registration(&state, &form.username, &errors);
    }

    match state
        .user_service
        .register(RegisterInput::new(form.username.trim(), form.password1.as_str()))
        .await
    {
        Ok(_) => Ok(Redirect::to("/auth/login/").into_response()),
        Err(UserServiceError::UserExists(_)) => {
            let mut errors = FormErrors::new();
            errors.add("username", "A user with that username already exists.");
            render_registration(&state, &form.username, &errors)
        }
        Err(UserServiceError::ValidationError(message)) => {
            render_registration(&state, &form.username, &FormErrors::general(message))
        }
        Err(e) => Err(e.into()),
    }
}

fn render_login(
    state: &AppState,
    username: &str,
    next: Option<&str>,
    errors: &FormErrors,
) -> Result<Response, WebError> {
    let mut context = base_context(None);
    context.insert("username", username);
    context.insert("next", &next.unwrap_or(""));
    context.insert("errors", errors);
    Ok(state.render("registration/login.html", &context)?.into_response())
}

/// GET /auth/login/
async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
) -> Result<Response, WebError> {
    render_login(&state, "", query.next.as_deref(), &FormErrors::new())
}

/// POST /auth/login/ - opens a session and sets the cookie
async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let next = form.next.as_deref().or(query.next.as_deref());
    if let Err(errors) = form.validate() {
        return render_login(&state, &form.username, next, &errors);
    }

    match state
        .user_service
        .login(LoginInput::new(form.username.as_str(), form.password.as_str()))
        .await
    {
        Ok(session) => Ok((
            [(
                header::SET_COOKIE,
                session_cookie(&session.id, state.session_max_age, state.cookie_secure),
            )],
            Redirect::to(safe_next(next)),
        )
            .into_response()),
        Err(UserServiceError::AuthenticationError(message)) => {
            render_login(&state, &form.username, next, &FormErrors::general(message))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /auth/logout/ - closes the session and shows the goodbye page
async fn logout(
    State(state): State<AppState>,
    token: Option<Extension<SessionToken>>,
) -> Result<Response, WebError> {
    if let Some(Extension(SessionToken(token))) = token {
        state.user_service.logout(&token).await?;
    }

    let html = state.render("registration/logged_out.html", &base_context(None))?;
    Ok((
        [(header::SET_COOKIE, clear_session_cookie(state.cookie_secure))],
        html,
    )
        .into_response())
}

fn render_password_change(
    state: &AppState,
    user: &User,
    errors: &FormErrors,
) -> Result<Response, WebError> {
    let mut context = base_context(Some(user));
    context.insert("errors", errors);
    Ok(state
        .render("registration/password_change_form.html", &context)?
        .into_response())
}

/// GET /auth/password_change/
async fn password_change_page(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, WebError> {
    render_password_change(&state, &user, &FormErrors::new())
}

/// POST /auth/password_change/ - other sessions of the user are closed
async fn password_change(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<PasswordChangeForm>,
) -> Result<Response, WebError> {
    if let Err(errors) = form.validate(&user.username) {
        return render_password_change(&state, &user, &errors);
    }

    match state
        .user_service
        .change_password(&user, &form.old_password, &form.new_password1)
        .await
    {
        Ok(session) => Ok((
            [(
                header::SET_COOKIE,
                session_cookie(&session.id, state.session_max_age, state.cookie_secure),
            )],
            Redirect::to("/auth/password_change/done/"),
        )
            .into_response()),
        Err(UserServiceError::AuthenticationError(message)) => {
            let mut errors = FormErrors::new();
            errors.add("old_password", message);
            render_password_change(&state, &user, &errors)
        }
        Err(UserServiceError::ValidationError(message)) => {
            let mut errors = FormErrors::new();
            errors.add("new_password2", message);
            render_password_change(&state, &user, &errors)
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /auth/password_change/done/
async fn password_change_done(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, WebError> {
    Ok(state
        .render(
            "registration/password_change_done.html",
            &base_context(Some(&user)),
        )?
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/posts/3/")), "/posts/3/");
        assert_eq!(safe_next(Some("/profile/a/?page=2")), "/profile/a/?page=2");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(Some("/\\evil")), "/");
        assert_eq!(safe_next(Some("")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
