use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use super::{ImageError, ImageStore, ImageUpload, StoredImage};

/// URL prefix the router serves `LocalImageStore` files under.
pub const UPLOADS_PATH: &str = "/uploads";

/// Writes uploads to a directory on disk. Used when no cloud credentials are configured.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    dir: PathBuf,
}

impl LocalImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage, ImageError> {
        let extension = image.format()?;
        let filename = format!("{}.{}", Uuid::new_v4().simple(), extension);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&filename), &image.bytes).await?;

        tracing::debug!("Stored upload '{}' as {}", image.file_name, filename);
        Ok(StoredImage { url: format!("{UPLOADS_PATH}/{filename}"), filename })
    }

    async fn remove(&self, image: &StoredImage) -> Result<(), ImageError> {
        let name = image.filename.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(ImageError::Provider(format!("invalid upload name '{name}'")));
        }

        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
