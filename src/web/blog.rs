//! Blog pages
//!
//! Listings only show posts passing the visibility rule. Authors may open
//! and manage their own hidden posts; anyone else trying to edit or delete
//! a post is sent back to its page.

use axum::{
    extract::{FromRequest, Multipart, Query, Request, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;

use super::error::WebError;
use super::forms::{format_datetime, CommentForm, FormErrors, PostFields, PostForm};
use super::middleware::{AuthenticatedUser, MaybeUser, PathParams};
use super::{base_context, redirect_to_post, redirect_to_profile, AppState, PageQuery};
use crate::models::{ListParams, PostInput, PostWithMeta, User, POSTS_PER_PAGE};
use crate::services::{authorize_mutation, Authorization, MediaError, PostServiceError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/category/{category_slug}/", get(category_posts))
        .route("/posts/create/", get(create_post_page).post(create_post))
        .route("/posts/{post_id}/", get(post_detail))
        .route("/posts/{post_id}/edit/", get(edit_post_page).post(edit_post))
        .route("/posts/{post_id}/delete/", get(delete_post_page).post(delete_post))
}

fn page_params(query: &PageQuery) -> ListParams {
    ListParams::from_query(query.page.as_deref(), POSTS_PER_PAGE)
}

/// GET / - visible posts, newest first
async fn index(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<PageQuery>,
) -> Result<Response, WebError> {
    let page = state
        .post_service
        .list_index(&page_params(&query), Utc::now())
        .await?;

    let mut context = base_context(viewer.as_ref());
    context.insert("page_obj", &page);
    Ok(state.render("blog/index.html", &context)?.into_response())
}

/// GET /category/{category_slug}/ - visible posts of a published category
async fn category_posts(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathParams(slug): PathParams<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, WebError> {
    let category = state.category_service.get_published_by_slug(&slug).await?;
    let page = state
        .post_service
        .list_category(category.id, &page_params(&query), Utc::now())
        .await?;

    let mut context = base_context(viewer.as_ref());
    context.insert("category", &category);
    context.insert("page_obj", &page);
    Ok(state.render("blog/category.html", &context)?.into_response())
}

/// GET /posts/{post_id}/ - post with its comments
async fn post_detail(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathParams(post_id): PathParams<i64>,
) -> Result<Response, WebError> {
    let post = state
        .post_service
        .get_for_viewer(post_id, viewer.as_ref(), Utc::now())
        .await?;
    let comments = state.comment_service.list_by_post(post_id).await?;

    let mut context = base_context(viewer.as_ref());
    context.insert("post", &post);
    context.insert("comments", &comments);
    context.insert("form", &CommentForm::default());
    context.insert("errors", &FormErrors::new());
    Ok(state.render("blog/detail.html", &context)?.into_response())
}

/// Show the post form, with errors after a failed submission
async fn render_post_form(
    state: &AppState,
    user: &User,
    fields: &PostFields,
    errors: &FormErrors,
    post: Option<&PostWithMeta>,
) -> Result<Response, WebError> {
    let categories = state.category_service.list_all().await?;
    let locations = state.location_service.list_all().await?;

    let mut context = base_context(Some(user));
    context.insert("form", fields);
    context.insert("errors", errors);
    context.insert("categories", &categories);
    context.insert("locations", &locations);
    context.insert("post", &post);
    context.insert("deleting", &false);
    Ok(state.render("blog/create.html", &context)?.into_response())
}

fn fields_from_post(post: &PostWithMeta) -> PostFields {
    PostFields {
        title: post.post.title.clone(),
        text: post.post.text.clone(),
        pub_date: format_datetime(post.post.pub_date),
        category: post
            .post
            .category_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        location: post
            .post
            .location_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
    }
}

/// Validate a submitted post form, then store its image.
///
/// An inner `Err` holds the field errors to show the form again with.
async fn prepare_input(
    state: &AppState,
    form: &PostForm,
    existing: Option<&PostWithMeta>,
) -> Result<Result<PostInput, FormErrors>, WebError> {
    let mut errors = FormErrors::new();
    let valid = match form.fields.validate() {
        Ok(valid) => Some(valid),
        Err(field_errors) => {
            errors = field_errors;
            None
        }
    };

    if let Some(file) = &form.image {
        if let Err(e) = state
            .media
            .validate(&file.content_type, file.data.len() as u64)
        {
            errors.add("image", e.to_string());
        }
    }

    let Some(valid) = valid.filter(|_| errors.is_empty()) else {
        return Ok(Err(errors));
    };

    let input = PostInput {
        title: valid.title,
        text: valid.text,
        pub_date: valid.pub_date,
        is_published: existing.map_or(true, |p| p.post.is_published),
        category_id: Some(valid.category_id),
        location_id: Some(valid.location_id),
        image: existing
            .filter(|_| !form.clear_image)
            .and_then(|p| p.post.image.clone()),
    };
    // Nothing is written to the media root until the references check out
    let mut input = match state.post_service.validate(input).await {
        Ok(input) => input,
        Err(PostServiceError::ValidationError(message)) => {
            return Ok(Err(FormErrors::general(message)))
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(file) = &form.image {
        match state.media.save_image(&file.content_type, &file.data).await {
            Ok(path) => input.image = Some(path),
            Err(e @ MediaError::Io(_)) => return Err(e.into()),
            Err(e) => {
                errors.add("image", e.to_string());
                return Ok(Err(errors));
            }
        }
    }

    Ok(Ok(input))
}

/// GET /posts/create/
async fn create_post_page(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, WebError> {
    let fields = PostFields {
        pub_date: format_datetime(Utc::now()),
        ..PostFields::default()
    };
    render_post_form(&state, &user, &fields, &FormErrors::new(), None).await
}

/// POST /posts/create/ - the new post belongs to the current user
async fn create_post(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let form = PostForm::read(multipart).await?;
    let input = match prepare_input(&state, &form, None).await? {
        Ok(input) => input,
        Err(errors) => return render_post_form(&state, &user, &form.fields, &errors, None).await,
    };

    match state.post_service.create(&user, input).await {
        Ok(_) => Ok(redirect_to_profile(&user.username).into_response()),
        Err(PostServiceError::ValidationError(message)) => {
            render_post_form(&state, &user, &form.fields, &FormErrors::general(message), None)
                .await
        }
        Err(e) => Err(e.into()),
    }
}

/// Load a post and apply the ownership guard.
///
/// Anyone but the author gets the inner `Err`: a redirect to the post.
async fn owned_post(
    state: &AppState,
    viewer: Option<User>,
    post_id: i64,
) -> Result<Result<(User, PostWithMeta), Response>, WebError> {
    let post = state.post_service.get(post_id).await?;
    match (authorize_mutation(viewer.as_ref(), post.post.author_id), viewer) {
        (Authorization::Allow, Some(user)) => Ok(Ok((user, post))),
        _ => Ok(Err(redirect_to_post(post_id).into_response())),
    }
}

/// GET /posts/{post_id}/edit/
async fn edit_post_page(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathParams(post_id): PathParams<i64>,
) -> Result<Response, WebError> {
    let (user, post) = match owned_post(&state, viewer, post_id).await? {
        Ok(owned) => owned,
        Err(redirect) => return Ok(redirect),
    };
    render_post_form(
        &state,
        &user,
        &fields_from_post(&post),
        &FormErrors::new(),
        Some(&post),
    )
    .await
}

/// POST /posts/{post_id}/edit/
async fn edit_post(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathParams(post_id): PathParams<i64>,
    request: Request,
) -> Result<Response, WebError> {
    let (user, post) = match owned_post(&state, viewer, post_id).await? {
        Ok(owned) => owned,
        Err(redirect) => return Ok(redirect),
    };

    let multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|e| WebError::BadRequest(e.body_text()))?;
    let form = PostForm::read(multipart).await?;
    let input = match prepare_input(&state, &form, Some(&post)).await? {
        Ok(input) => input,
        Err(errors) => {
            return render_post_form(&state, &user, &form.fields, &errors, Some(&post)).await
        }
    };

    match state.post_service.update(post_id, input).await {
        Ok(_) => Ok(redirect_to_post(post_id).into_response()),
        Err(PostServiceError::ValidationError(message)) => {
            render_post_form(
                &state,
                &user,
                &form.fields,
                &FormErrors::general(message),
                Some(&post),
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /posts/{post_id}/delete/ - confirmation
async fn delete_post_page(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathParams(post_id): PathParams<i64>,
) -> Result<Response, WebError> {
    let (user, post) = match owned_post(&state, viewer, post_id).await? {
        Ok(owned) => owned,
        Err(redirect) => return Ok(redirect),
    };

    let mut context = base_context(Some(&user));
    context.insert("form", &fields_from_post(&post));
    context.insert("errors", &FormErrors::new());
    context.insert("categories", &state.category_service.list_all().await?);
    context.insert("locations", &state.location_service.list_all().await?);
    context.insert("post", &post);
    context.insert("deleting", &true);
    Ok(state.render("blog/create.html", &context)?.into_response())
}

/// POST /posts/{post_id}/delete/
async fn delete_post(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathParams(post_id): PathParams<i64>,
) -> Result<Response, WebError> {
    let (user, _) = match owned_post(&state, viewer, post_id).await? {
        Ok(owned) => owned,
        Err(redirect) => return Ok(redirect),
    };

    state.post_service.delete(post_id).await?;
    Ok(redirect_to_profile(&user.username).into_response())
}
