use crate::models::{AppError, AppResult, Comment, NewComment, Session};
use crate::repository::{CommentRepository, PostRepository};
use crate::services::Clock;
use crate::storage::{discard_image, store_image, ImageUpload, ObjectStore, Partition};
use crate::utils::{ensure_owner, validate_text_fields};
use chrono::SubsecRound;
use std::sync::Arc;

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        posts: Arc<dyn PostRepository>,
        store: Arc<dyn ObjectStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            comments,
            posts,
            store,
            clock,
        }
    }

    /// Adds a comment to an existing post. A reply target must be a
    /// comment on the same post.
    pub async fn create_comment(
        &self,
        author: &Session,
        input: NewComment,
        image: Option<ImageUpload>,
    ) -> AppResult<Comment> {
        validate_text_fields(&input.title, &input.content)?;

        if self.posts.get_by_id(input.post_id).await?.is_none() {
            return Err(AppError::NotFound("Post".to_string()));
        }
        if let Some(parent_id) = input.reply_to_comment_id {
            let parent = self
                .comments
                .get_by_id(parent_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Reply target comment".to_string()))?;
            if parent.post_id != input.post_id {
                return Err(AppError::ValidationError(
                    "reply target belongs to a different post".to_string(),
                ));
            }
        }

        let image_url = match image {
            Some(upload) => store_image(self.store.as_ref(), Partition::Comment, upload).await?,
            None => String::new(),
        };

        let mut comment = Comment {
            id: 0,
            post_id: input.post_id,
            title: input.title,
            content: input.content,
            author_id: author.id.clone(),
            author_name: author.name.clone(),
            author_image: author.image.clone(),
            image_url,
            reply_to_comment_id: input.reply_to_comment_id,
            created_at: self.clock.now().trunc_subsecs(6),
        };

        comment.id = self
            .comments
            .create(&comment)
            .await
            .map_err(|e| e.context("failed to create comment"))?;

        tracing::info!(comment_id = comment.id, post_id = comment.post_id, "comment created");
        Ok(comment)
    }

    pub async fn get_comment(&self, id: i64) -> AppResult<Comment> {
        self.comments
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment".to_string()))
    }

    pub async fn list_comments_by_post(&self, post_id: i64) -> AppResult<Vec<Comment>> {
        self.comments.list_by_post(post_id).await
    }

    pub async fn update_comment(
        &self,
        actor: &Session,
        id: i64,
        title: String,
        content: String,
        image: Option<ImageUpload>,
    ) -> AppResult<Comment> {
        let mut comment = self.get_comment(id).await?;
        ensure_owner(&comment.author_id, actor, "comments")?;
        validate_text_fields(&title, &content)?;

        let mut replaced = None;
        if let Some(upload) = image {
            let url = store_image(self.store.as_ref(), Partition::Comment, upload).await?;
            replaced = Some(std::mem::replace(&mut comment.image_url, url));
        }
        comment.title = title;
        comment.content = content;

        if let Err(e) = self.comments.update(&comment).await {
            if replaced.is_some() {
                discard_image(self.store.as_ref(), Partition::Comment, &comment.image_url).await;
            }
            return Err(e);
        }
        if let Some(old) = replaced {
            discard_image(self.store.as_ref(), Partition::Comment, &old).await;
        }
        Ok(comment)
    }

    pub async fn delete_comment(&self, actor: &Session, id: i64) -> AppResult<()> {
        let comment = self.get_comment(id).await?;
        ensure_owner(&comment.author_id, actor, "comments")?;

        self.comments.delete(id).await?;
        tracing::info!(comment_id = id, "comment deleted");
        discard_image(self.store.as_ref(), Partition::Comment, &comment.image_url).await;
        Ok(())
    }
}
