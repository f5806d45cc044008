pub mod cloudinary;
pub mod local;

use async_trait::async_trait;
use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cloudinary::CloudinaryStore;
pub use local::LocalImageStore;

/// File extensions accepted for listing images.
pub const ALLOWED_FORMATS: &[&str] = &["png", "jpg", "jpeg"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported image format '{0}', expected one of png, jpg, jpeg")]
    UnsupportedFormat(String),

    #[error("Image upload rejected: {0}")]
    Provider(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Where an uploaded image ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub url: String,
    pub filename: String,
}

impl StoredImage {
    /// Reduced-size variant for the edit form preview. Cloudinary URLs get a
    /// width transformation; other URLs are returned as they are.
    pub fn thumbnail_url(&self) -> String {
        if self.url.contains("res.cloudinary.com") {
            self.url.replacen("/upload", "/upload/w_250", 1)
        } else {
            self.url.clone()
        }
    }
}

/// A file part taken from a submitted form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Lower-cased extension, checked against [`ALLOWED_FORMATS`].
    pub fn format(&self) -> Result<String, ImageError> {
        let extension = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if ALLOWED_FORMATS.contains(&extension.as_str()) {
            Ok(extension)
        } else {
            Err(ImageError::UnsupportedFormat(extension))
        }
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage, ImageError>;

    /// Deletes a stored image. An image that is already gone is not an error.
    async fn remove(&self, image: &StoredImage) -> Result<(), ImageError>;
}
