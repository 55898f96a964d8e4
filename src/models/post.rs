use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::Comment;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub author_image: String,
    pub image_url: String,
    pub comments: Vec<Comment>,
    pub is_archive: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Fields a client supplies for a new post. Authorship comes from the
/// resolved session, never from the request body.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

/// Multipart body accepted by post create and update.
#[derive(ToSchema)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PostListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub include_archived: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AuthorPostsQuery {
    pub author_id: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Clamps client paging input: non-positive limits fall back to the
/// default, negative offsets to zero.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = offset.filter(|o| *o >= 0).unwrap_or(0);
    (limit, offset)
}
