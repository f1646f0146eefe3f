//! Comment handlers
//!
//! Comments are addressed through their post; a comment id under the wrong
//! post does not exist. Only the comment's author may change it.

use axum::{
    extract::{Form, Request, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;

use super::error::WebError;
use super::forms::{read_form, CommentForm, FormErrors};
use super::middleware::{AuthenticatedUser, MaybeUser, PathParams};
use super::{base_context, redirect_to_post, AppState};
use crate::models::{CommentWithMeta, User};
use crate::services::{authorize_mutation, Authorization};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/{post_id}/comment/", post(add_comment))
        .route(
            "/posts/{post_id}/edit_comment/{comment_id}/",
            get(edit_comment_page).post(edit_comment),
        )
        .route(
            "/posts/{post_id}/delete_comment/{comment_id}/",
            get(delete_comment_page).post(delete_comment),
        )
}

/// POST /posts/{post_id}/comment/
async fn add_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    PathParams(post_id): PathParams<i64>,
    Form(form): Form<CommentForm>,
) -> Result<Response, WebError> {
    let post = state
        .post_service
        .get_for_viewer(post_id, Some(&user), Utc::now())
        .await?;

    let text = match form.validate() {
        Ok(text) => text,
        Err(errors) => {
            let comments = state.comment_service.list_by_post(post_id).await?;
            let mut context = base_context(Some(&user));
            context.insert("post", &post);
            context.insert("comments", &comments);
            context.insert("form", &form);
            context.insert("errors", &errors);
            return Ok(state.render("blog/detail.html", &context)?.into_response());
        }
    };

    state.comment_service.create(post_id, &user, &text).await?;
    Ok(redirect_to_post(post_id).into_response())
}

/// Load a comment and apply the ownership guard
async fn owned_comment(
    state: &AppState,
    viewer: Option<User>,
    post_id: i64,
    comment_id: i64,
) -> Result<Result<(User, CommentWithMeta), Response>, WebError> {
    let comment = state
        .comment_service
        .get_for_post(post_id, comment_id)
        .await?;
    match (authorize_mutation(viewer.as_ref(), comment.comment.author_id), viewer) {
        (Authorization::Allow, Some(user)) => Ok(Ok((user, comment))),
        _ => Ok(Err(redirect_to_post(post_id).into_response())),
    }
}

fn render_comment_page(
    state: &AppState,
    user: &User,
    comment: &CommentWithMeta,
    form: Option<&CommentForm>,
    errors: &FormErrors,
) -> Result<Response, WebError> {
    let mut context = base_context(Some(user));
    context.insert("comment", comment);
    context.insert("form", &form);
    context.insert("errors", errors);
    Ok(state.render("blog/comment.html", &context)?.into_response())
}

/// GET /posts/{post_id}/edit_comment/{comment_id}/
async fn edit_comment_page(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathParams((post_id, comment_id)): PathParams<(i64, i64)>,
) -> Result<Response, WebError> {
    let (user, comment) = match owned_comment(&state, viewer, post_id, comment_id).await? {
        Ok(owned) => owned,
        Err(redirect) => return Ok(redirect),
    };
    let form = CommentForm {
        text: comment.comment.text.clone(),
    };
    render_comment_page(&state, &user, &comment, Some(&form), &FormErrors::new())
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
async fn edit_comment(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathParams((post_id, comment_id)): PathParams<(i64, i64)>,
    request: Request,
) -> Result<Response, WebError> {
    let (user, comment) = match owned_comment(&state, viewer, post_id, comment_id).await? {
        Ok(owned) => owned,
        Err(redirect) => return Ok(redirect),
    };

    let form: CommentForm = read_form(request, &state).await?;
    match form.validate() {
        Ok(text) => {
            state.comment_service.update(comment_id, &text).await?;
            Ok(redirect_to_post(post_id).into_response())
        }
        Err(errors) => render_comment_page(&state, &user, &comment, Some(&form), &errors),
    }
}

/// GET /posts/{post_id}/delete_comment/{comment_id}/ - confirmation
async fn delete_comment_page(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathParams((post_id, comment_id)): PathParams<(i64, i64)>,
) -> Result<Response, WebError> {
    let (user, comment) = match owned_comment(&state, viewer, post_id, comment_id).await? {
        Ok(owned) => owned,
        Err(redirect) => return Ok(redirect),
    };
    render_comment_page(&state, &user, &comment, None, &FormErrors::new())
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
async fn delete_comment(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathParams((post_id, comment_id)): PathParams<(i64, i64)>,
) -> Result<Response, WebError> {
    if let Err(redirect) = owned_comment(&state, viewer, post_id, comment_id).await? {
        return Ok(redirect);
    }

    state.comment_service.delete(comment_id).await?;
    Ok(redirect_to_post(post_id).into_response())
}
