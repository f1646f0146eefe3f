//! Embedded stylesheets and images under `/static/`

use axum::{
    body::Body,
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

use super::error::WebError;

#[derive(RustEmbed)]
#[folder = "static/"]
struct StaticAssets;

/// GET /static/{*path}
pub async fn serve_static(Path(path): Path<String>) -> Response {
    // %20 and friends in file names
    let decoded = match urlencoding::decode(&path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => path.clone(),
    };
    let asset_path = decoded.trim_start_matches('/');

    match StaticAssets::get(asset_path) {
        Some(content) => build_response(asset_path, content.data.into_owned()),
        None => WebError::NotFound.into_response(),
    }
}

fn build_response(path: &str, data: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type(path)),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        Body::from(data),
    )
        .into_response()
}

pub fn content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "css" => "text/css",
        "js" => "application/javascript",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff2" => "font/woff2",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("css/style.css"), "text/css");
        assert_eq!(content_type("img/logo.JPG"), "application/octet-stream");
        assert_eq!(content_type("img/logo.jpeg"), "image/jpeg");
        assert_eq!(content_type("favicon.ico"), "image/x-icon");
    }

    #[test]
    fn test_stylesheet_is_embedded() {
        assert!(StaticAssets::get("css/style.css").is_some());
    }
}
