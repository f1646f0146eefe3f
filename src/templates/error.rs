//! Template engine error types

use thiserror::Error;

/// Template loading and rendering errors
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template not registered
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Template failed to parse or render
    #[error("Template error: {0}")]
    Render(String),

    /// Override directory could not be read
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
