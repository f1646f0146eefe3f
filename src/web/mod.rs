//! Web layer - HTML handlers and routing
//!
//! This module contains every page of the site:
//! - Blog pages (index, post detail, category, post create/edit/delete)
//! - Comments under posts
//! - Profiles
//! - Registration, login, logout and password change
//! - Static pages
//! - The staff console
//! - Embedded static assets and uploaded media

pub mod admin;
pub mod auth;
pub mod blog;
pub mod comments;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod pages;
pub mod profile;
pub mod static_files;

#[cfg(test)]
mod tests;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    response::{Html, Redirect},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tera::Context;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::db::repositories::{
    SqlxCategoryRepository, SqlxCommentRepository, SqlxLocationRepository, SqlxPostRepository,
    SqlxSessionRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{
    CategoryService, CommentService, LocationService, MediaStore, PostService, UserService,
};
use crate::templates::TemplateEngine;

pub use error::WebError;

/// Shared state of every handler
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub post_service: Arc<PostService>,
    pub category_service: Arc<CategoryService>,
    pub location_service: Arc<LocationService>,
    pub comment_service: Arc<CommentService>,
    pub media: Arc<MediaStore>,
    pub templates: Arc<TemplateEngine>,
    /// Lifetime of the session cookie in seconds
    pub session_max_age: i64,
    pub cookie_secure: bool,
}

impl AppState {
    /// Wire repositories and services over `pool`
    pub fn new(pool: DynDatabasePool, config: &Config) -> anyhow::Result<Self> {
        let users = SqlxUserRepository::boxed(pool.clone());
        let sessions = SqlxSessionRepository::boxed(pool.clone());
        let posts = SqlxPostRepository::boxed(pool.clone());
        let categories = SqlxCategoryRepository::boxed(pool.clone());
        let locations = SqlxLocationRepository::boxed(pool.clone());
        let comments = SqlxCommentRepository::boxed(pool);

        let templates = TemplateEngine::new(config.templates.path.as_deref())?;

        Ok(Self {
            user_service: Arc::new(UserService::with_session_expiration(
                users,
                sessions,
                config.session.expiration_days,
            )),
            post_service: Arc::new(PostService::new(
                posts.clone(),
                categories.clone(),
                locations.clone(),
            )),
            category_service: Arc::new(CategoryService::new(categories)),
            location_service: Arc::new(LocationService::new(locations)),
            comment_service: Arc::new(CommentService::new(comments, posts)),
            media: Arc::new(MediaStore::new(config.media.clone())),
            templates: Arc::new(templates),
            session_max_age: config.session.expiration_days * 24 * 60 * 60,
            cookie_secure: config.session.cookie_secure,
        })
    }

    /// Render a page template
    pub fn render(&self, template: &str, context: &Context) -> Result<Html<String>, WebError> {
        Ok(Html(self.templates.render(template, context)?))
    }
}

/// Variables every page template relies on
pub fn base_context(user: Option<&User>) -> Context {
    let mut context = Context::new();
    context.insert("user", &user);
    context
}

/// `?page=` (and the staff filters) of a listing
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub q: Option<String>,
    pub is_published: Option<String>,
}

/// Redirect to the public page of a post
pub fn redirect_to_post(post_id: i64) -> Redirect {
    Redirect::to(&format!("/posts/{}/", post_id))
}

/// Redirect to a user's profile
pub fn redirect_to_profile(username: &str) -> Redirect {
    Redirect::to(&format!("/profile/{}/", username))
}

async fn not_found() -> WebError {
    WebError::NotFound
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.media.max_file_size())
        .unwrap_or(usize::MAX)
        .saturating_add(1024 * 1024);

    Router::new()
        .merge(blog::router())
        .merge(comments::router())
        .merge(profile::router())
        .merge(auth::router())
        .merge(pages::router())
        .merge(admin::router())
        .route("/static/{*path}", get(static_files::serve_static))
        .nest_service("/media", ServeDir::new(state.media.root()))
        .fallback(not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::render_error_pages,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::load_current_user,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
