//! Static pages

use axum::{extract::State, response::Html, routing::get, Router};

use super::error::WebError;
use super::middleware::MaybeUser;
use super::{base_context, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pages/about/", get(about))
        .route("/pages/rules/", get(rules))
}

async fn about(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
) -> Result<Html<String>, WebError> {
    state.render("pages/about.html", &base_context(viewer.as_ref()))
}

async fn rules(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
) -> Result<Html<String>, WebError> {
    state.render("pages/rules.html", &base_context(viewer.as_ref()))
}
