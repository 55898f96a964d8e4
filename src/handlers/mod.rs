pub mod character_handlers;
pub mod comment_handlers;
pub mod image_handlers;
pub mod post_handlers;
pub mod session_handlers;

use crate::models::{AppError, AppResult};
use crate::services::{CharacterSource, CommentService, PostService, SessionService};
use crate::storage::{ImageUpload, ObjectStore};
use axum::extract::Multipart;
use std::collections::HashMap;
use std::sync::Arc;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub sessions: SessionService,
    pub posts: PostService,
    pub comments: CommentService,
    pub characters: Arc<dyn CharacterSource>,
    pub store: Arc<dyn ObjectStore>,
}

/// Text fields and the optional `image` part of a multipart form.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    image: Option<ImageUpload>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = FormData::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::ValidationError(format!("failed to parse form: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "image" {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::ValidationError(format!("failed to read image: {}", e))
                })?;

                // Browsers send an empty part when no file was picked.
                if !bytes.is_empty() {
                    form.image = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::ValidationError(format!("failed to read {}: {}", name, e)))?;
            form.fields.insert(name, value);
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// Parses an optional integer field. Absent or blank yields `None`.
    pub fn int(&self, name: &str) -> AppResult<Option<i64>> {
        match self.fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| AppError::ValidationError(format!("invalid {}", name))),
        }
    }

    pub fn take_image(&mut self) -> Option<ImageUpload> {
        self.image.take()
    }
}
