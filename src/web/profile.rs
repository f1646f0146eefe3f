//! Profile pages

use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;

use super::error::WebError;
use super::forms::{FormErrors, ProfileForm};
use super::middleware::{AuthenticatedUser, MaybeUser, PathParams};
use super::{base_context, redirect_to_profile, AppState, PageQuery};
use crate::models::{ListParams, UpdateProfileInput, User, POSTS_PER_PAGE};
use crate::services::UserServiceError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/edit/", get(edit_profile_page).post(edit_profile))
        .route("/profile/{username}/", get(profile))
}

/// GET /profile/{username}/ - every post when viewing oneself, visible ones
/// otherwise
async fn profile(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathParams(username): PathParams<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, WebError> {
    let owner = state
        .user_service
        .get_by_username(&username)
        .await?
        .ok_or(WebError::NotFound)?;

    let params = ListParams::from_query(query.page.as_deref(), POSTS_PER_PAGE);
    let page = state
        .post_service
        .list_profile(&owner, viewer.as_ref(), &params, Utc::now())
        .await?;

    let mut context = base_context(viewer.as_ref());
    context.insert("profile", &owner);
    context.insert("full_name", &owner.full_name());
    context.insert("page_obj", &page);
    Ok(state.render("blog/profile.html", &context)?.into_response())
}

fn render_profile_form(
    state: &AppState,
    user: &User,
    form: &ProfileForm,
    errors: &FormErrors,
) -> Result<Response, WebError> {
    let mut context = base_context(Some(user));
    context.insert("form", form);
    context.insert("errors", errors);
    Ok(state.render("blog/user.html", &context)?.into_response())
}

/// GET /profile/edit/
async fn edit_profile_page(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, WebError> {
    let form = ProfileForm {
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
    };
    render_profile_form(&state, &user, &form, &FormErrors::new())
}

/// POST /profile/edit/
async fn edit_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, WebError> {
    if let Err(errors) = form.validate() {
        return render_profile_form(&state, &user, &form, &errors);
    }

    let input = UpdateProfileInput {
        username: form.username.clone(),
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        email: form.email.clone(),
    };
    match state.user_service.update_profile(&user, input).await {
        Ok(updated) => Ok(redirect_to_profile(&updated.username).into_response()),
        Err(UserServiceError::UserExists(_)) => {
            let mut errors = FormErrors::new();
            errors.add("username", "A user with that username already exists.");
            render_profile_form(&state, &user, &form, &errors)
        }
        Err(UserServiceError::ValidationError(message)) => {
            render_profile_form(&state, &user, &form, &FormErrors::general(message))
        }
        Err(e) => Err(e.into()),
    }
}
