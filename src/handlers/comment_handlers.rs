use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::handlers::{AppState, FormData};
use crate::middleware::CurrentSession;
use crate::models::{AppError, AppResult, Comment, NewComment, PostCommentsQuery};

/// Comment on a post
#[utoipa::path(
    post,
    path = "/api/comments",
    request_body(content = CommentForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 400, description = "Invalid form"),
        (status = 401, description = "No active session"),
        (status = 404, description = "Post or reply target not found")
    ),
    tag = "Comments"
)]
pub async fn create_comment(
    State(state): State<AppState>,
    current: CurrentSession,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let author = current.require()?;
    let mut form = FormData::read(multipart).await?;
    let image = form.take_image();

    let post_id = form
        .int("post_id")?
        .ok_or_else(|| AppError::ValidationError("post_id is required".to_string()))?;
    let input = NewComment {
        post_id,
        title: form.text("title"),
        content: form.text("content"),
        reply_to_comment_id: form.int("reply_to_comment_id")?,
    };

    let comment = state.comments.create_comment(&author, input, image).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// List comments of a post, oldest first
#[utoipa::path(
    get,
    path = "/api/comments/post",
    params(PostCommentsQuery),
    responses((status = 200, description = "Comments of the post", body = [Comment])),
    tag = "Comments"
)]
pub async fn list_comments_by_post(
    State(state): State<AppState>,
    Query(query): Query<PostCommentsQuery>,
) -> AppResult<Json<Vec<Comment>>> {
    let comments = state.comments.list_comments_by_post(query.post_id).await?;
    Ok(Json(comments))
}

/// Fetch a comment
#[utoipa::path(
    get,
    path = "/api/comments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    responses(
        (status = 200, description = "The comment", body = Comment),
        (status = 404, description = "Comment not found")
    ),
    tag = "Comments"
)]
pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Comment>> {
    let comment = state.comments.get_comment(id).await?;
    Ok(Json(comment))
}

/// Edit a comment
#[utoipa::path(
    put,
    path = "/api/comments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    request_body(content = CommentForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Comment updated", body = Comment),
        (status = 401, description = "No active session"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found")
    ),
    tag = "Comments"
)]
pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentSession,
    multipart: Multipart,
) -> AppResult<Json<Comment>> {
    let actor = current.require()?;
    let mut form = FormData::read(multipart).await?;
    let image = form.take_image();

    let comment = state
        .comments
        .update_comment(&actor, id, form.text("title"), form.text("content"), image)
        .await?;
    Ok(Json(comment))
}

/// Delete a comment
#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "No active session"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found")
    ),
    tag = "Comments"
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentSession,
) -> AppResult<StatusCode> {
    let actor = current.require()?;
    state.comments.delete_comment(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
