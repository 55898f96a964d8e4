use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::handlers::{AppState, FormData};
use crate::middleware::CurrentSession;
use crate::models::{page_bounds, AppResult, AuthorPostsQuery, NewPost, Post, PostListQuery};

fn new_post(form: &FormData) -> NewPost {
    NewPost {
        title: form.text("title"),
        content: form.text("content"),
    }
}

/// Create a post
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body(content = PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Missing title or content, or a non-image attachment"),
        (status = 401, description = "No active session")
    ),
    tag = "Posts"
)]
pub async fn create_post(
    State(state): State<AppState>,
    current: CurrentSession,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Post>)> {
    let author = current.require()?;
    let mut form = FormData::read(multipart).await?;
    let image = form.take_image();

    let post = state.posts.create_post(&author, new_post(&form), image).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// List posts, newest first
#[utoipa::path(
    get,
    path = "/api/posts",
    params(PostListQuery),
    responses((status = 200, description = "A page of posts", body = [Post])),
    tag = "Posts"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let (limit, offset) = page_bounds(query.limit, query.offset);
    let posts = state
        .posts
        .list_posts(limit, offset, query.include_archived.unwrap_or(false))
        .await?;
    Ok(Json(posts))
}

/// List posts written by one session
#[utoipa::path(
    get,
    path = "/api/posts/author",
    params(AuthorPostsQuery),
    responses(
        (status = 200, description = "A page of the author's posts", body = [Post]),
        (status = 400, description = "author_id missing")
    ),
    tag = "Posts"
)]
pub async fn list_posts_by_author(
    State(state): State<AppState>,
    Query(query): Query<AuthorPostsQuery>,
) -> AppResult<Json<Vec<Post>>> {
    crate::utils::validate_required("author_id", &query.author_id)?;
    let (limit, offset) = page_bounds(query.limit, query.offset);
    let posts = state
        .posts
        .list_posts_by_author(&query.author_id, limit, offset)
        .await?;
    Ok(Json(posts))
}

/// Fetch a post with its comments
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = Post),
        (status = 404, description = "Post not found")
    ),
    tag = "Posts"
)]
pub async fn get_post(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Post>> {
    let post = state.posts.get_post(id).await?;
    Ok(Json(post))
}

/// Edit a post
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    request_body(content = PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Post updated", body = Post),
        (status = 401, description = "No active session"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found")
    ),
    tag = "Posts"
)]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentSession,
    multipart: Multipart,
) -> AppResult<Json<Post>> {
    let actor = current.require()?;
    let mut form = FormData::read(multipart).await?;
    let image = form.take_image();

    let post = state.posts.update_post(&actor, id, new_post(&form), image).await?;
    Ok(Json(post))
}

/// Delete a post and its comments
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "No active session"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found")
    ),
    tag = "Posts"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentSession,
) -> AppResult<StatusCode> {
    let actor = current.require()?;
    state.posts.delete_post(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Archive a post
#[utoipa::path(
    post,
    path = "/api/posts/{id}/archive",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post archived"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found")
    ),
    tag = "Posts"
)]
pub async fn archive_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentSession,
) -> AppResult<Json<Value>> {
    let actor = current.require()?;
    state.posts.archive_post(&actor, id).await?;
    Ok(Json(json!({ "id": id, "is_archive": true })))
}

/// Restore an archived post
#[utoipa::path(
    post,
    path = "/api/posts/{id}/unarchive",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post restored"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found")
    ),
    tag = "Posts"
)]
pub async fn unarchive_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    current: CurrentSession,
) -> AppResult<Json<Value>> {
    let actor = current.require()?;
    state.posts.unarchive_post(&actor, id).await?;
    Ok(Json(json!({ "id": id, "is_archive": false })))
}
