//! Uploaded post images
//!
//! Images are written under `<media.path>/post_image/` with a random name
//! and referenced from posts by their path relative to the media root.

use crate::config::MediaConfig;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

/// Subdirectory of the media root holding post images
pub const POST_IMAGE_DIR: &str = "post_image";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Unsupported image type: {0}")]
    InvalidType(String),

    #[error("Image too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("Empty upload")]
    Empty,

    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes uploaded images to disk
#[derive(Debug, Clone)]
pub struct MediaStore {
    config: MediaConfig,
}

impl MediaStore {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Media root directory
    pub fn root(&self) -> &Path {
        &self.config.path
    }

    pub fn max_file_size(&self) -> u64 {
        self.config.max_file_size
    }

    /// Check an upload before anything touches the disk
    pub fn validate(&self, content_type: &str, size: u64) -> Result<(), MediaError> {
        if size == 0 {
            return Err(MediaError::Empty);
        }
        if !self.config.accepts(content_type) {
            return Err(MediaError::InvalidType(content_type.to_string()));
        }
        if size > self.config.max_file_size {
            return Err(MediaError::TooLarge {
                size,
                limit: self.config.max_file_size,
            });
        }
        Ok(())
    }

    /// Store an image and return its path relative to the media root
    pub async fn save_image(&self, content_type: &str, data: &[u8]) -> Result<String, MediaError> {
        self.validate(content_type, data.len() as u64)?;

        let dir = self.config.path.join(POST_IMAGE_DIR);
        fs::create_dir_all(&dir).await?;

        let filename = format!(
            "{}.{}",
            Uuid::new_v4().simple(),
            MediaConfig::extension_for(content_type)
        );
        fs::write(dir.join(&filename), data).await?;

        let relative = format!("{}/{}", POST_IMAGE_DIR, filename);
        tracing::info!(path = %relative, size = data.len(), "image stored");
        Ok(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> MediaStore {
        MediaStore::new(MediaConfig {
            path: dir.path().to_path_buf(),
            max_file_size: 16,
            ..MediaConfig::default()
        })
    }

    #[tokio::test]
    async fn test_save_image_writes_under_post_image() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let relative = store.save_image("image/png", b"\x89PNG....").await.unwrap();
        assert!(relative.starts_with("post_image/"));
        assert!(relative.ends_with(".png"));

        let written = std::fs::read(store.root().join(&relative)).unwrap();
        assert_eq!(written, b"\x89PNG....");
    }

    #[tokio::test]
    async fn test_rejects_bad_uploads() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert!(matches!(
            store.save_image("text/html", b"<html>").await,
            Err(MediaError::InvalidType(_))
        ));
        assert!(matches!(
            store.save_image("image/jpeg", &[0u8; 17]).await,
            Err(MediaError::TooLarge { size: 17, limit: 16 })
        ));
        assert!(matches!(
            store.save_image("image/jpeg", &[]).await,
            Err(MediaError::Empty)
        ));
        assert!(!dir.path().join(POST_IMAGE_DIR).exists());
    }
}
