use axum::extract::Multipart;
use std::collections::HashMap;

use crate::error::AppError;
use crate::images::ImageUpload;

pub const IMAGE_FIELD: &str = "listing[image]";

/// Text fields and the optional image part of a listing form.
#[derive(Debug, Default)]
pub struct ListingSubmission {
    pub fields: HashMap<String, String>,
    pub image: Option<ImageUpload>,
}

impl ListingSubmission {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut submission = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == IMAGE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was chosen.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                submission.image = Some(ImageUpload { file_name, content_type, bytes });
            } else {
                let value = field.text().await?;
                submission.fields.insert(name, value);
            }
        }

        Ok(submission)
    }
}
