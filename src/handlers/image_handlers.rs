use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::handlers::AppState;
use crate::models::{AppError, AppResult};
use crate::storage::Partition;

const IMMUTABLE_CACHE: &str = "public, max-age=31536000";

/// Serve a stored image
#[utoipa::path(
    get,
    path = "/images/{partition}/{name}",
    params(
        ("partition" = String, Path, description = "avatars, posts or comments"),
        ("name" = String, Path, description = "Object name")
    ),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Unknown partition or object")
    ),
    tag = "Images"
)]
pub async fn serve_image(
    State(state): State<AppState>,
    Path((partition, name)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let partition = Partition::parse(&partition)
        .ok_or_else(|| AppError::NotFound(format!("Partition {}", partition)))?;
    let object = state.store.download(partition, &name).await?;

    Ok((
        [
            (header::CONTENT_TYPE, object.content_type),
            (header::CACHE_CONTROL, IMMUTABLE_CACHE.to_string()),
        ],
        object.bytes,
    ))
}
