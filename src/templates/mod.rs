//! Template engine
//!
//! HTML pages are rendered with Tera. The built-in templates are embedded
//! into the binary; a directory configured under `templates.path` may
//! replace any of them by providing a file with the same relative name.

use rust_embed::RustEmbed;
use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use tera::{Context, Tera};

mod error;

pub use error::TemplateError;

/// Built-in page templates
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct EmbeddedTemplates;

/// Renders the site's HTML pages
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Load the embedded templates, then apply overrides from `override_dir`
    pub fn new(override_dir: Option<&Path>) -> Result<Self, TemplateError> {
        let mut templates: Vec<(String, String)> = Vec::new();

        for name in EmbeddedTemplates::iter() {
            let Some(file) = EmbeddedTemplates::get(&name) else {
                continue;
            };
            let content = String::from_utf8(file.data.into_owned()).map_err(|e| {
                TemplateError::Render(format!("Template {} is not UTF-8: {}", name, e))
            })?;
            templates.push((name.to_string(), content));
        }

        if let Some(dir) = override_dir {
            let mut overrides = Vec::new();
            collect_templates_from_dir(dir, dir, &mut overrides)?;
            tracing::info!(
                count = overrides.len(),
                dir = %dir.display(),
                "loaded template overrides"
            );
            for (name, content) in overrides {
                match templates.iter_mut().find(|(existing, _)| *existing == name) {
                    Some(slot) => slot.1 = content,
                    None => templates.push((name, content)),
                }
            }
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| TemplateError::Render(describe(&e)))?;

        Ok(Self { tera })
    }

    /// Render `template` with `context`
    pub fn render(&self, template: &str, context: &Context) -> Result<String, TemplateError> {
        if !self.has_template(template) {
            return Err(TemplateError::NotFound(template.to_string()));
        }
        self.tera.render(template, context).map_err(|e| {
            TemplateError::Render(format!("Failed to render '{}': {}", template, describe(&e)))
        })
    }

    pub fn has_template(&self, template: &str) -> bool {
        self.tera.get_template_names().any(|name| name == template)
    }
}

/// Flatten an error and its sources into one message
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(&format!("\n  Caused by: {}", cause));
        source = cause.source();
    }
    message
}

fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<(), TemplateError> {
    if !current_path.exists() {
        return Ok(());
    }

    for entry in fs::read_dir(current_path)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let relative = path.strip_prefix(base_path).map_err(|_| {
                TemplateError::Render(format!("Template outside override dir: {:?}", path))
            })?;
            let name = relative.to_string_lossy().replace('\\', "/");
            templates.push((name, fs::read_to_string(&path)?));
        }
    }

    Ok(())
}
