use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub author_image: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_comment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub title: String,
    pub content: String,
    pub reply_to_comment_id: Option<i64>,
}

/// Multipart body accepted by comment create. Updates only read
/// `title`, `content` and `image`.
#[derive(ToSchema)]
pub struct CommentForm {
    pub post_id: i64,
    pub title: String,
    pub content: String,
    pub reply_to_comment_id: Option<i64>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PostCommentsQuery {
    pub post_id: i64,
}
