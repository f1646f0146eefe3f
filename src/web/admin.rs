//! Staff console
//!
//! Every page here requires a staff account. Listings show 100 rows per page
//! and accept a `q` search term.

use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Serialize;

use super::error::WebError;
use super::forms::{
    checkbox, format_datetime, AdminPostForm, CategoryForm, FormErrors, LocationForm,
};
use super::middleware::{PathParams, StaffUser};
use super::{base_context, AppState, PageQuery};
use crate::models::{ListParams, PostInput, PostWithMeta, User};
use crate::services::access::is_publicly_visible;
use crate::services::{
    CategoryServiceError, LocationServiceError, PostServiceError, PublicationFilter,
};

/// Rows per page on staff listings
pub const ADMIN_PER_PAGE: u32 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/", get(dashboard))
        .route("/admin/categories/", get(category_list))
        .route(
            "/admin/categories/add/",
            get(category_add_page).post(category_add),
        )
        .route(
            "/admin/categories/{id}/change/",
            get(category_change_page).post(category_change),
        )
        .route(
            "/admin/categories/{id}/delete/",
            get(category_delete_page).post(category_delete),
        )
        .route("/admin/locations/", get(location_list))
        .route(
            "/admin/locations/add/",
            get(location_add_page).post(location_add),
        )
        .route(
            "/admin/locations/{id}/change/",
            get(location_change_page).post(location_change),
        )
        .route(
            "/admin/locations/{id}/delete/",
            get(location_delete_page).post(location_delete),
        )
        .route("/admin/posts/", get(post_list))
        .route(
            "/admin/posts/{id}/change/",
            get(post_change_page).post(post_change),
        )
        .route(
            "/admin/posts/{id}/delete/",
            get(post_delete_page).post(post_delete),
        )
        .route("/admin/comments/", get(comment_list))
        .route(
            "/admin/comments/{id}/delete/",
            get(comment_delete_page).post(comment_delete),
        )
}

fn admin_params(query: &PageQuery) -> ListParams {
    ListParams::from_query(query.page.as_deref(), ADMIN_PER_PAGE)
}

fn search_term(query: &PageQuery) -> Option<&str> {
    query.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
}

fn listing_context(user: &User, query: &PageQuery) -> tera::Context {
    let mut context = base_context(Some(user));
    context.insert("q", search_term(query).unwrap_or(""));
    context
}

/// Confirmation page shared by every delete action
fn render_confirm_delete(
    state: &AppState,
    user: &User,
    kind: &str,
    label: &str,
    cancel_url: &str,
) -> Result<Response, WebError> {
    let mut context = base_context(Some(user));
    context.insert("kind", kind);
    context.insert("label", label);
    context.insert("cancel_url", cancel_url);
    Ok(state.render("admin/confirm_delete.html", &context)?.into_response())
}

#[derive(Debug, Serialize)]
struct DashboardCounts {
    users: i64,
    posts: i64,
    categories: i64,
    locations: i64,
    comments: i64,
}

/// GET /admin/
async fn dashboard(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
) -> Result<Response, WebError> {
    let one = ListParams::new(1, 1);
    let counts = DashboardCounts {
        users: state.user_service.count().await?,
        posts: state.post_service.count().await?,
        categories: state.category_service.list(None, &one).await?.total,
        locations: state.location_service.list(None, &one).await?.total,
        comments: state.comment_service.list(None, &one).await?.total,
    };

    let mut context = base_context(Some(&user));
    context.insert("counts", &counts);
    Ok(state.render("admin/index.html", &context)?.into_response())
}

// Categories

/// GET /admin/categories/
async fn category_list(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Query(query): Query<PageQuery>,
) -> Result<Response, WebError> {
    let page = state
        .category_service
        .list(search_term(&query), &admin_params(&query))
        .await?;

    let mut context = listing_context(&user, &query);
    context.insert("page_obj", &page);
    Ok(state.render("admin/category_list.html", &context)?.into_response())
}

fn render_category_form(
    state: &AppState,
    user: &User,
    form: &CategoryForm,
    errors: &FormErrors,
    category_id: Option<i64>,
) -> Result<Response, WebError> {
    let mut context = base_context(Some(user));
    context.insert("form", form);
    context.insert("is_published", &checkbox(&form.is_published));
    context.insert("errors", errors);
    context.insert("category_id", &category_id);
    Ok(state.render("admin/category_form.html", &context)?.into_response())
}

/// Turn a failed category save into field errors, or a real failure
fn category_errors(error: CategoryServiceError) -> Result<FormErrors, WebError> {
    match error {
        CategoryServiceError::DuplicateSlug(_) => {
            let mut errors = FormErrors::new();
            errors.add("slug", "Category with this slug already exists.");
            Ok(errors)
        }
        CategoryServiceError::ValidationError(message) => Ok(FormErrors::general(message)),
        e => Err(e.into()),
    }
}

/// GET /admin/categories/add/
async fn category_add_page(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
) -> Result<Response, WebError> {
    let form = CategoryForm {
        is_published: Some("on".to_string()),
        ..CategoryForm::default()
    };
    render_category_form(&state, &user, &form, &FormErrors::new(), None)
}

/// POST /admin/categories/add/
async fn category_add(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Form(form): Form<CategoryForm>,
) -> Result<Response, WebError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return render_category_form(&state, &user, &form, &errors, None),
    };
    match state.category_service.create(input).await {
        Ok(_) => Ok(Redirect::to("/admin/categories/").into_response()),
        Err(e) => render_category_form(&state, &user, &form, &category_errors(e)?, None),
    }
}

/// GET /admin/categories/{id}/change/
async fn category_change_page(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    PathParams(id): PathParams<i64>,
) -> Result<Response, WebError> {
    let category = state.category_service.get_by_id(id).await?;
    let form = CategoryForm {
        title: category.title,
        description: category.description,
        slug: category.slug,
        is_published: category.is_published.then(|| "on".to_string()),
    };
    render_category_form(&state, &user, &form, &FormErrors::new(), Some(id))
}

/// POST /admin/categories/{id}/change/
async fn category_change(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    PathParams(id): PathParams<i64>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, WebError> {
    state.category_service.get_by_id(id).await?;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return render_category_form(&state, &user, &form, &errors, Some(id)),
    };
    match state.category_service.update(id, input).await {
        Ok(_) => Ok(Redirect::to("/admin/categories/").into_response()),
        Err(e) => render_category_form(&state, &user, &form, &category_errors(e)?, Some(id)),
    }
}

/// GET /admin/categories/{id}/delete/
async fn category_delete_page(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    PathParams(id): PathParams<i64>,
) -> Result<Response, WebError> {
    let category = state.category_service.get_by_id(id).await?;
    render_confirm_delete(
        &state,
        &user,
        "category",
        &category.title,
        "/admin/categories/",
    )
}

/// POST /admin/categories/{id}/delete/ - posts stay, without a category
async fn category_delete(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    PathParams(id): PathParams<i64>,
) -> Result<Response, WebError> {
    state.category_service.delete(id).await?;
    Ok(Redirect::to("/admin/categories/").into_response())
}

// Locations

/// GET /admin/locations/
async fn location_list(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Query(query): Query<PageQuery>,
) -> Result<Response, WebError> {
    let page = state
        .location_service
        .list(search_term(&query), &admin_params(&query))
        .await?;

    let mut context = listing_context(&user, &query);
    context.insert("page_obj", &page);
    Ok(state.render("admin/location_list.html", &context)?.into_response())
}

fn render_location_form(
    state: &AppState,
    user: &User,
    form: &LocationForm,
    errors: &FormErrors,
    location_id: Option<i64>,
) -> Result<Response, WebError> {
    let mut context = base_context(Some(user));
    context.insert("form", form);
    context.insert("is_published", &checkbox(&form.is_published));
    context.insert("errors", errors);
    context.insert("location_id", &location_id);
    Ok(state.render("admin/location_form.html", &context)?.into_response())
}

fn location_errors(error: LocationServiceError) -> Result<FormErrors, WebError> {
    match error {
        LocationServiceError::ValidationError(message) => Ok(FormErrors::general(message)),
        e => Err(e.into()),
    }
}

/// GET /admin/locations/add/
async fn location_add_page(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
) -> Result<Response, WebError> {
    let form = LocationForm {
        is_published: Some("on".to_string()),
        ..LocationForm::default()
    };
    render_location_form(&state, &user, &form, &FormErrors::new(), None)
}

/// POST /admin/locations/add/
async fn location_add(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Form(form): Form<LocationForm>,
) -> Result<Response, WebError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return render_location_form(&state, &user, &form, &errors, None),
    };
    match state.location_service.create(input).await {
        Ok(_) => Ok(Redirect::to("/admin/locations/").into_response()),
        Err(e) => render_location_form(&state, &user, &form, &location_errors(e)?, None),
    }
}

/// GET /admin/locations/{id}/change/
async fn location_change_page(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    PathParams(id): PathParams<i64>,
) -> Result<Response, WebError> {
    let location = state.location_service.get_by_id(id).await?;
    let form = LocationForm {
        name: location.name,
        is_published: location.is_published.then(|| "on".to_string()),
    };
    render_location_form(&state, &user, &form, &FormErrors::new(), Some(id))
}

/// POST /admin/locations/{id}/change/
async fn location_change(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    PathParams(id): PathParams<i64>,
    Form(form): Form<LocationForm>,
) -> Result<Response, WebError> {
    state.location_service.get_by_id(id).await?;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return render_location_form(&state, &user, &form, &errors, Some(id)),
    };
    match state.location_service.update(id, input).await {
        Ok(_) => Ok(Redirect::to("/admin/locations/").into_response()),
        Err(e) => render_location_form(&state, &user, &form, &location_errors(e)?, Some(id)),
    }
}

/// GET /admin/locations/{id}/delete/
async fn location_delete_page(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    PathParams(id): PathParams<i64>,
) -> Result<Response, WebError> {
    let location = state.location_service.get_by_id(id).await?;
    render_confirm_delete(
        &state,
        &user,
        "location",
        &location.name,
        "/admin/locations/",
    )
}

/// POST /admin/locations/{id}/delete/
async fn location_delete(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    PathParams(id): PathParams<i64>,
) -> Result<Response, WebError> {
    state.location_service.delete(id).await?;
    Ok(Redirect::to("/admin/locations/").into_response())
}

// Posts

/// A post row of the staff listing
#[derive(Debug, Serialize)]
struct AdminPostRow {
    #[serde(flatten)]
    post: PostWithMeta,
    /// Passes the public visibility rule right now
    visible: bool,
    scheduled: bool,
}

/// GET /admin/posts/ - `is_published=published|not_published` filters on
/// the visibility rule
async fn post_list(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Query(query): Query<PageQuery>,
) -> Result<Response, WebError> {
    let now = Utc::now();
    let publication = query.is_published.as_deref().and_then(PublicationFilter::parse);
    let page = state
        .post_service
        .list_admin(
            publication,
            search_term(&query).map(str::to_string),
            &admin_params(&query),
            now,
        )
        .await?
        .map(|post| AdminPostRow {
            visible: is_publicly_visible(&post, now),
            scheduled: post.post.is_scheduled(now),
            post,
        });

    let mut context = listing_context(&user, &query);
    context.insert("page_obj", &page);
    context.insert(
        "is_published",
        match publication {
            Some(PublicationFilter::Published) => "published",
            Some(PublicationFilter::NotPublished) => "not_published",
            None => "",
        },
    );
    Ok(state.render("admin/post_list.html", &context)?.into_response())
}

async fn render_post_form(
    state: &AppState,
    user: &User,
    form: &AdminPostForm,
    errors: &FormErrors,
    post: &PostWithMeta,
) -> Result<Response, WebError> {
    let mut context = base_context(Some(user));
    context.insert("form", &form.fields());
    context.insert("is_published", &checkbox(&form.is_published));
    context.insert("errors", errors);
    context.insert("post", post);
    context.insert("categories", &state.category_service.list_all().await?);
    context.insert("locations", &state.location_service.list_all().await?);
    Ok(state.render("admin/post_form.html", &context)?.into_response())
}

/// GET /admin/posts/{id}/change/
async fn post_change_page(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    PathParams(id): PathParams<i64>,
) -> Result<Response, WebError> {
    let post = state.post_service.get(id).await?;
    let form = AdminPostForm {
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
        is_published: post.post.is_published.then(|| "on".to_string()),
    };
    render_post_form(&state, &user, &form, &FormErrors::new(), &post).await
}

/// POST /admin/posts/{id}/change/ - the image and author stay as they are
async fn post_change(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    PathParams(id): PathParams<i64>,
    Form(form): Form<AdminPostForm>,
) -> Result<Response, WebError> {
    let post = state.post_service.get(id).await?;
    let valid = match form.fields().validate() {
        Ok(valid) => valid,
        Err(errors) => return render_post_form(&state, &user, &form, &errors, &post).await,
    };

    let input = PostInput {
        title: valid.title,
        text: valid.text,
        pub_date: valid.pub_date,
        is_published: checkbox(&form.is_published),
        category_id: Some(valid.category_id),
        location_id: Some(valid.location_id),
        ..PostInput::from_post(&post.post)
    };
    match state.post_service.update(id, input).await {
        Ok(_) => Ok(Redirect::to("/admin/posts/").into_response()),
        Err(PostServiceError::ValidationError(message)) => {
            render_post_form(&state, &user, &form, &FormErrors::general(message), &post).await
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /admin/posts/{id}/delete/
async fn post_delete_page(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    PathParams(id): PathParams<i64>,
) -> Result<Response, WebError> {
    let post = state.post_service.get(id).await?;
    render_confirm_delete(&state, &user, "post", &post.post.title, "/admin/posts/")
}

/// POST /admin/posts/{id}/delete/ - its comments go with it
async fn post_delete(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    PathParams(id): PathParams<i64>,
) -> Result<Response, WebError> {
    state.post_service.delete(id).await?;
    Ok(Redirect::to("/admin/posts/").into_response())
}

// Comments

/// GET /admin/comments/ - `q` is a post id or an author's username
async fn comment_list(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Query(query): Query<PageQuery>,
) -> Result<Response, WebError> {
    let page = state
        .comment_service
        .list(search_term(&query), &admin_params(&query))
        .await?;

    let mut context = listing_context(&user, &query);
    context.insert("page_obj", &page);
    Ok(state.render("admin/comment_list.html", &context)?.into_response())
}

/// GET /admin/comments/{id}/delete/
async fn comment_delete_page(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    PathParams(id): PathParams<i64>,
) -> Result<Response, WebError> {
    let comment = state.comment_service.get_by_id(id).await?;
    let label = format!(
        "{} on \"{}\"",
        comment.author_username, comment.post_title
    );
    render_confirm_delete(&state, &user, "comment", &label, "/admin/comments/")
}

/// POST /admin/comments/{id}/delete/
async fn comment_delete(
    State(state): State<AppState>,
    StaffUser(_): StaffUser,
    PathParams(id): PathParams<i64>,
) -> Result<Response, WebError> {
    state.comment_service.delete(id).await?;
    Ok(Redirect::to("/admin/comments/").into_response())
}
