use crate::models::{AppError, AppResult};
use crate::storage::{generate_object_name, parse_object_url, ObjectStore, Partition};

/// An image attached to a post or comment form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Validates an attachment and stores it under a freshly generated name.
pub async fn store_image(
    store: &dyn ObjectStore,
    partition: Partition,
    upload: ImageUpload,
) -> AppResult<String> {
    if !upload.content_type.starts_with("image/") {
        return Err(AppError::ValidationError(format!(
            "invalid content type: {}",
            upload.content_type
        )));
    }
    if upload.bytes.is_empty() {
        return Err(AppError::ValidationError("image is empty".to_string()));
    }

    let name = generate_object_name(&upload.file_name);
    store
        .upload(partition, &name, upload.bytes, &upload.content_type)
        .await
}

/// Removes an image previously stored in `partition`. Empty URLs and URLs
/// pointing anywhere else are ignored; a failed delete is only logged.
pub async fn discard_image(store: &dyn ObjectStore, partition: Partition, url: &str) {
    let Some((found, name)) = parse_object_url(url) else {
        return;
    };
    if found != partition {
        return;
    }

    match store.delete(partition, &name).await {
        Ok(()) => tracing::debug!(url, "stored image removed"),
        Err(e) => tracing::warn!(url, error = %e, "failed to remove stored image"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsObjectStore;
    use tempfile::tempdir;

    fn upload(content_type: &str, bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            file_name: "my cat.png".to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn stores_valid_image() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path(), "http://localhost:8080").await.unwrap();

        let url = store_image(&store, Partition::Post, upload("image/png", b"\x89PNG"))
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:8080/images/posts/"));
        assert!(url.ends_with("-my_cat.png"));
    }

    #[tokio::test]
    async fn rejects_non_images_and_empty_bodies() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path(), "http://localhost:8080").await.unwrap();

        let result = store_image(&store, Partition::Post, upload("application/pdf", b"%PDF")).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));

        let result = store_image(&store, Partition::Comment, upload("image/gif", b"")).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn discard_only_touches_its_own_partition() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::open(dir.path(), "http://localhost:8080").await.unwrap();
        let post_url = store_image(&store, Partition::Post, upload("image/png", b"p"))
            .await
            .unwrap();
        let avatar_url = store
            .upload(Partition::Avatar, "s-character-image.png", vec![1], "image/png")
            .await
            .unwrap();

        discard_image(&store, Partition::Post, &avatar_url).await;
        discard_image(&store, Partition::Post, "https://elsewhere.test/x.png").await;
        discard_image(&store, Partition::Post, "").await;
        assert!(store.download(Partition::Avatar, "s-character-image.png").await.is_ok());

        discard_image(&store, Partition::Post, &post_url).await;
        let (_, name) = parse_object_url(&post_url).unwrap();
        assert!(matches!(
            store.download(Partition::Post, &name).await,
            Err(AppError::NotFound(_))
        ));
    }
}
