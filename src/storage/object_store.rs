//! Blob storage split into three fixed partitions.
//!
//! Objects are addressed by `(partition, name)` and published under a
//! canonical URL that never changes once issued.

use crate::models::{AppError, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Avatar,
    Post,
    Comment,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Partition::Avatar, Partition::Post, Partition::Comment];

    /// Directory / URL segment for this partition.
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Avatar => "avatars",
            Partition::Post => "posts",
            Partition::Comment => "comments",
        }
    }

    pub fn parse(segment: &str) -> Option<Self> {
        Partition::ALL.into_iter().find(|p| p.as_str() == segment)
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `name` and returns the canonical URL. Either the
    /// whole object becomes visible or nothing does.
    async fn upload(
        &self,
        partition: Partition,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String>;

    async fn download(&self, partition: Partition, name: &str) -> AppResult<StoredObject>;

    async fn delete(&self, partition: Partition, name: &str) -> AppResult<()>;
}

/// Builds a collision-resistant object name: `<nanos>-<8 hex>-<file name>`.
pub fn generate_object_name(file_name: &str) -> String {
    let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let entropy = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", timestamp, &entropy[..8], sanitize_file_name(file_name))
}

/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.is_empty()
        || name.contains(['/', '\\'])
        || name.starts_with('.')
        || name.contains("..")
    {
        return Err(AppError::ValidationError(format!("invalid object name: {}", name)));
    }
    Ok(())
}

/// Recovers `(partition, name)` from a canonical object URL of the form
/// `<base>/images/<partition>/<name>`.
pub fn parse_object_url(url: &str) -> Option<(Partition, String)> {
    let mut segments = url.rsplitn(3, '/');
    let name = segments.next().filter(|n| !n.is_empty())?;
    let partition = Partition::parse(segments.next()?)?;
    segments
        .next()?
        .ends_with("/images")
        .then(|| (partition, name.to_string()))
}

/// Object store backed by a local directory tree, one subdirectory per
/// partition. Each object is a single file: the content type on the first
/// line, then the raw bytes.
pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: String,
}

fn encode_object(content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(content_type.len() + 1 + bytes.len());
    raw.extend_from_slice(content_type.as_bytes());
    raw.push(b'\n');
    raw.extend_from_slice(bytes);
    raw
}

fn decode_object(mut raw: Vec<u8>) -> Option<StoredObject> {
    let split = raw.iter().position(|b| *b == b'\n')?;
    let bytes = raw.split_off(split + 1);
    raw.truncate(split);
    let content_type = String::from_utf8(raw).ok()?;
    Some(StoredObject {
        bytes,
        content_type,
    })
}

impl FsObjectStore {
    /// Creates the partition directories if they are missing.
    pub async fn open(root: impl AsRef<Path>, public_base_url: &str) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        for partition in Partition::ALL {
            tokio::fs::create_dir_all(root.join(partition.as_str()))
                .await
                .map_err(|e| {
                    AppError::StorageFailure(format!(
                        "failed to create partition {}: {}",
                        partition.as_str(),
                        e
                    ))
                })?;
        }

        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, partition: Partition, name: &str) -> String {
        format!("{}/images/{}/{}", self.public_base_url, partition.as_str(), name)
    }

    fn object_path(&self, partition: Partition, name: &str) -> PathBuf {
        self.root.join(partition.as_str()).join(name)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    /// Stages the whole object next to its final path and renames it into
    /// place. On any failure the staging file is removed and a previous
    /// object under the same name is left untouched.
    async fn upload(
        &self,
        partition: Partition,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String> {
        validate_name(name)?;
        if content_type.contains(['\r', '\n']) {
            return Err(AppError::ValidationError(format!(
                "invalid content type: {:?}",
                content_type
            )));
        }

        let final_path = self.object_path(partition, name);
        let staging = self
            .root
            .join(partition.as_str())
            .join(format!(".{}.{}.part", name, uuid::Uuid::new_v4().simple()));

        let storage_err = |e: std::io::Error| {
            AppError::StorageFailure(format!("failed to write {}/{}: {}", partition.as_str(), name, e))
        };

        let staged = async {
            tokio::fs::write(&staging, encode_object(content_type, &bytes)).await?;
            tokio::fs::rename(&staging, &final_path).await
        };
        if let Err(e) = staged.await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(storage_err(e));
        }

        tracing::debug!(partition = partition.as_str(), name, size = bytes.len(), "object stored");
        Ok(self.url_for(partition, name))
    }

    async fn download(&self, partition: Partition, name: &str) -> AppResult<StoredObject> {
        validate_name(name)?;

        let raw = match tokio::fs::read(self.object_path(partition, name)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!("Object {}/{}", partition.as_str(), name)));
            }
            Err(e) => {
                return Err(AppError::StorageFailure(format!(
                    "failed to read {}/{}: {}",
                    partition.as_str(),
                    name,
                    e
                )));
            }
        };

        decode_object(raw).ok_or_else(|| {
            AppError::StorageFailure(format!("corrupt object {}/{}", partition.as_str(), name))
        })
    }

    async fn delete(&self, partition: Partition, name: &str) -> AppResult<()> {
        validate_name(name)?;

        match tokio::fs::remove_file(self.object_path(partition, name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::StorageFailure(format!(
                "failed to delete {}/{}: {}",
                partition.as_str(),
                name,
                e
            ))),
        }
    }
}
