use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{ImageError, ImageStore, ImageUpload, StoredImage};
use crate::config::CloudinaryConfig;

/// Signed uploads to Cloudinary. The account must use SHA-256 request signatures.
#[derive(Debug, Clone)]
pub struct CloudinaryStore {
    config: CloudinaryConfig,
    folder: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig, folder: impl Into<String>) -> Self {
        Self { config, folder: folder.into(), client: reqwest::Client::new() }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("https://api.cloudinary.com/v1_1/{}/image/{action}", self.config.cloud_name)
    }

    /// Signature over the alphabetically sorted upload parameters followed by the secret.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);

        let joined = sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl ImageStore for CloudinaryStore {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage, ImageError> {
        let format = image.format()?;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = [
            ("allowed_formats", "png,jpg,jpeg".to_string()),
            ("folder", self.folder.clone()),
            ("timestamp", timestamp),
        ];
        let signature = self.sign(&params);

        let mime = image.content_type.clone().unwrap_or_else(|| format!("image/{format}"));
        let part = Part::bytes(image.bytes.to_vec()).file_name(image.file_name.clone()).mime_str(&mime)?;

        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self.client.post(self.endpoint("upload")).multipart(form).send().await?;
        let body: UploadResponse = provider_json(response).await?;
        tracing::info!("Uploaded '{}' to Cloudinary as {}", image.file_name, body.public_id);
        Ok(StoredImage { url: body.secure_url, filename: body.public_id })
    }

    async fn remove(&self, image: &StoredImage) -> Result<(), ImageError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = [("public_id", image.filename.clone()), ("timestamp", timestamp)];
        let signature = self.sign(&params);

        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self.client.post(self.endpoint("destroy")).multipart(form).send().await?;
        let body: DestroyResponse = provider_json(response).await?;
        match body.result.as_str() {
            "ok" | "not found" => {
                tracing::info!("Removed {} from Cloudinary", image.filename);
                Ok(())
            }
            other => Err(ImageError::Provider(other.to_string())),
        }
    }
}

async fn provider_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ImageError> {
    if !response.status().is_success() {
        let status = response.status();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => status.to_string(),
        };
        return Err(ImageError::Provider(message));
    }
    Ok(response.json().await?)
}
