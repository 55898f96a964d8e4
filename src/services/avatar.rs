//! Avatar resolution for new sessions.
//!
//! A character's image is tried against an ordered list of tiers. Each
//! tier either produces a URL or fails on its own; a failure is logged and
//! the next tier runs. When every tier fails the avatar is empty.

use crate::models::{AppError, AppResult};
use crate::services::ImageFetcher;
use crate::storage::{ObjectStore, Partition};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarTier {
    /// Download the image and copy it into the avatar partition.
    StoreLocally,
    /// Hand back the catalog's own image URL.
    RemoteUrl,
}

impl AvatarTier {
    fn label(&self) -> &'static str {
        match self {
            AvatarTier::StoreLocally => "store_locally",
            AvatarTier::RemoteUrl => "remote_url",
        }
    }
}

pub const DEFAULT_TIERS: [AvatarTier; 2] = [AvatarTier::StoreLocally, AvatarTier::RemoteUrl];

/// Picks a file extension by substring match on the source URL.
pub fn infer_extension(url: &str) -> &'static str {
    if url.contains(".jpeg") {
        ".jpeg"
    } else if url.contains(".png") {
        ".png"
    } else if url.contains(".gif") {
        ".gif"
    } else {
        ".jpg"
    }
}

pub fn avatar_object_name(session_id: &str, source_url: &str) -> String {
    format!("{}-character-image{}", session_id, infer_extension(source_url))
}

#[derive(Clone)]
pub struct AvatarPipeline {
    fetcher: Arc<dyn ImageFetcher>,
    store: Arc<dyn ObjectStore>,
    tiers: Vec<AvatarTier>,
}

impl AvatarPipeline {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, store: Arc<dyn ObjectStore>) -> Self {
        Self::with_tiers(fetcher, store, DEFAULT_TIERS.to_vec())
    }

    pub fn with_tiers(
        fetcher: Arc<dyn ImageFetcher>,
        store: Arc<dyn ObjectStore>,
        tiers: Vec<AvatarTier>,
    ) -> Self {
        Self {
            fetcher,
            store,
            tiers,
        }
    }

    /// Runs a single tier.
    pub async fn attempt(
        &self,
        tier: AvatarTier,
        session_id: &str,
        source_url: &str,
    ) -> AppResult<String> {
        match tier {
            AvatarTier::StoreLocally => {
                let image = self.fetcher.download_image(source_url).await?;
                if !image.content_type.starts_with("image/") {
                    return Err(AppError::ValidationError(format!(
                        "invalid content type: {}",
                        image.content_type
                    )));
                }

                let name = avatar_object_name(session_id, source_url);
                self.store
                    .upload(Partition::Avatar, &name, image.bytes, &image.content_type)
                    .await
            }
            AvatarTier::RemoteUrl => Ok(source_url.to_string()),
        }
    }

    /// First URL produced by any tier, or an empty string.
    pub async fn resolve(&self, session_id: &str, source_url: &str) -> String {
        if source_url.is_empty() {
            return String::new();
        }

        for tier in &self.tiers {
            match self.attempt(*tier, session_id, source_url).await {
                Ok(url) => {
                    tracing::debug!(session_id, tier = tier.label(), %url, "avatar resolved");
                    return url;
                }
                Err(e) => {
                    tracing::warn!(session_id, tier = tier.label(), error = %e, "avatar tier failed");
                }
            }
        }

        String::new()
    }
}
