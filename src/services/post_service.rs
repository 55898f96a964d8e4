use crate::models::{AppError, AppResult, NewPost, Post, Session};
use crate::repository::{CommentRepository, PostRepository};
use crate::services::Clock;
use crate::storage::{discard_image, store_image, ImageUpload, ObjectStore, Partition};
use crate::utils::{ensure_owner, validate_text_fields};
use chrono::{Duration, SubsecRound};
use std::sync::Arc;

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        store: Arc<dyn ObjectStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            posts,
            comments,
            store,
            clock,
            ttl,
        }
    }

    /// Creates a post authored by `author`. A failed image upload aborts
    /// the post.
    pub async fn create_post(
        &self,
        author: &Session,
        input: NewPost,
        image: Option<ImageUpload>,
    ) -> AppResult<Post> {
        validate_text_fields(&input.title, &input.content)?;

        let image_url = match image {
            Some(upload) => store_image(self.store.as_ref(), Partition::Post, upload).await?,
            None => String::new(),
        };

        let now = self.clock.now().trunc_subsecs(6);
        let mut post = Post {
            id: 0,
            title: input.title,
            content: input.content,
            author_id: author.id.clone(),
            author_name: author.name.clone(),
            author_image: author.image.clone(),
            image_url,
            comments: Vec::new(),
            is_archive: false,
            created_at: now,
            expires_at: Some(now + self.ttl),
        };

        post.id = self
            .posts
            .create(&post)
            .await
            .map_err(|e| e.context("failed to create post"))?;

        tracing::info!(post_id = post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    async fn load(&self, id: i64) -> AppResult<Post> {
        self.posts
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post".to_string()))
    }

    async fn with_comments(&self, mut post: Post) -> AppResult<Post> {
        post.comments = self.comments.list_by_post(post.id).await?;
        Ok(post)
    }

    pub async fn get_post(&self, id: i64) -> AppResult<Post> {
        let post = self.load(id).await?;
        self.with_comments(post).await
    }

    pub async fn list_posts(
        &self,
        limit: i64,
        offset: i64,
        include_archived: bool,
    ) -> AppResult<Vec<Post>> {
        let posts = self.posts.list(limit, offset, include_archived).await?;
        let mut loaded = Vec::with_capacity(posts.len());
        for post in posts {
            loaded.push(self.with_comments(post).await?);
        }
        Ok(loaded)
    }

    pub async fn list_posts_by_author(
        &self,
        author_id: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Post>> {
        let posts = self.posts.list_by_author(author_id, limit, offset).await?;
        let mut loaded = Vec::with_capacity(posts.len());
        for post in posts {
            loaded.push(self.with_comments(post).await?);
        }
        Ok(loaded)
    }

    /// Replaces title and content. The stored image is kept unless a new
    /// one is supplied.
    pub async fn update_post(
        &self,
        actor: &Session,
        id: i64,
        input: NewPost,
        image: Option<ImageUpload>,
    ) -> AppResult<Post> {
        let mut post = self.load(id).await?;
        ensure_owner(&post.author_id, actor, "posts")?;
        validate_text_fields(&input.title, &input.content)?;

        let mut replaced = None;
        if let Some(upload) = image {
            let url = store_image(self.store.as_ref(), Partition::Post, upload).await?;
            replaced = Some(std::mem::replace(&mut post.image_url, url));
        }
        post.title = input.title;
        post.content = input.content;

        if let Err(e) = self.posts.update(&post).await {
            if replaced.is_some() {
                discard_image(self.store.as_ref(), Partition::Post, &post.image_url).await;
            }
            return Err(e);
        }
        if let Some(old) = replaced {
            discard_image(self.store.as_ref(), Partition::Post, &old).await;
        }

        tracing::debug!(post_id = id, "post updated");
        self.with_comments(post).await
    }

    /// Deletes the post with its comments, then removes their images.
    pub async fn delete_post(&self, actor: &Session, id: i64) -> AppResult<()> {
        let post = self.load(id).await?;
        ensure_owner(&post.author_id, actor, "posts")?;
        let comments = self.comments.list_by_post(id).await?;

        self.posts.delete(id).await?;
        tracing::info!(post_id = id, "post deleted");

        discard_image(self.store.as_ref(), Partition::Post, &post.image_url).await;
        for comment in &comments {
            discard_image(self.store.as_ref(), Partition::Comment, &comment.image_url).await;
        }
        Ok(())
    }

    pub async fn archive_post(&self, actor: &Session, id: i64) -> AppResult<()> {
        let post = self.load(id).await?;
        ensure_owner(&post.author_id, actor, "posts")?;
        self.posts.set_archived(id, true, post.expires_at).await
    }

    /// Restores an archived post with a fresh lifetime, so the reaper leaves
    /// it alone for another full `ttl`.
    pub async fn unarchive_post(&self, actor: &Session, id: i64) -> AppResult<()> {
        let post = self.load(id).await?;
        ensure_owner(&post.author_id, actor, "posts")?;
        let expires_at = self.clock.now().trunc_subsecs(6) + self.ttl;
        self.posts.set_archived(id, false, Some(expires_at)).await
    }

    /// Archives posts whose lifetime has run out.
    pub async fn archive_stale_posts(&self) -> AppResult<usize> {
        let archived = self.posts.archive_expired(self.clock.now()).await?;
        if archived > 0 {
            tracing::info!(archived, "stale posts archived");
        }
        Ok(archived)
    }
}
