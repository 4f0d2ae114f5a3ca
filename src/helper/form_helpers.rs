use actix_multipart::Multipart;
use futures_util::StreamExt;
use std::collections::HashMap;
use thiserror::Error;

use crate::helper::generation_helpers::{Attachment, Attachments};

pub const MAX_IMAGES: usize = 5;
pub const MAX_TEXT_FIELDS: usize = 16;
pub const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Malformed multipart payload: {0}")]
    Multipart(#[from] actix_multipart::MultipartError),
    #[error("Invalid UTF-8 in form field '{0}'.")]
    Utf8(String),
    #[error("File is too large. Maximum size is {0}MB.")]
    TooLarge(u64),
    #[error("Unsupported file type '{0}'.")]
    UnsupportedType(String),
    #[error("At most 5 images can be attached.")]
    TooManyImages,
    #[error("Only one audio clip can be attached.")]
    DuplicateAudio,
    #[error("Too many form fields. At most 16 are accepted.")]
    TooManyFields,
    #[error("Form field '{0}' is too large.")]
    FieldTooLarge(String),
}

/// Text fields and files of a generation upload.
#[derive(Debug, Default)]
pub struct GenerationUpload {
    pub fields: HashMap<String, String>,
    pub attachments: Attachments,
}

fn is_allowed_image(mime: &str) -> bool {
    matches!(mime, "image/png" | "image/jpeg" | "image/webp" | "image/heic" | "image/heif")
}

fn is_allowed_audio(mime: &str) -> bool {
    mime.starts_with("audio/")
}

fn is_file_field(name: &str) -> bool {
    matches!(name, "image" | "images" | "audio")
}

/// Reads the whole multipart body into memory. `image` parts become image
/// attachments, `audio` becomes the voice clip, every other part is a text field.
/// Files are capped at `max_file_size_bytes` each; text fields are capped in
/// number and size.
pub async fn collect_generation_upload(
    mut payload: Multipart,
    max_file_size_bytes: usize,
) -> Result<GenerationUpload, UploadError> {
    let max_file_size_mb = (max_file_size_bytes / (1024 * 1024)) as u64;
    let mut upload = GenerationUpload::default();
    let mut text_fields = 0;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let field_name = field.content_disposition().get_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|mime| mime.essence_str().to_string());
        let is_file = is_file_field(&field_name);
        if !is_file {
            text_fields += 1;
            if text_fields > MAX_TEXT_FIELDS {
                return Err(UploadError::TooManyFields);
            }
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            let size = data.len() + chunk.len();
            if is_file && size > max_file_size_bytes {
                return Err(UploadError::TooLarge(max_file_size_mb));
            }
            if !is_file && size > MAX_TEXT_FIELD_BYTES {
                return Err(UploadError::FieldTooLarge(field_name));
            }
            data.extend_from_slice(&chunk);
        }

        match field_name.as_str() {
            "image" | "images" => {
                let mime = content_type.unwrap_or_default();
                if !is_allowed_image(&mime) {
                    return Err(UploadError::UnsupportedType(mime));
                }
                if upload.attachments.images.len() >= MAX_IMAGES {
                    return Err(UploadError::TooManyImages);
                }
                upload.attachments.images.push(Attachment { mime_type: mime, data });
            }
            "audio" => {
                let mime = content_type.unwrap_or_default();
                if !is_allowed_audio(&mime) {
                    return Err(UploadError::UnsupportedType(mime));
                }
                if upload.attachments.audio.is_some() {
                    return Err(UploadError::DuplicateAudio);
                }
                upload.attachments.audio = Some(Attachment { mime_type: mime, data });
            }
            _ => {
                // Handle UTF-8 error without panicking
                let value = String::from_utf8(data).map_err(|_| UploadError::Utf8(field_name.clone()))?;
                upload.fields.insert(field_name, value);
            }
        }
    }

    Ok(upload)
}
