use crate::models::{AppError, AppResult, Post};
use crate::repository::database::{from_db_time, to_db_time, Database};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Inserts the post and returns its new id.
    async fn create(&self, post: &Post) -> AppResult<i64>;
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Post>>;
    async fn list(&self, limit: i64, offset: i64, include_archived: bool) -> AppResult<Vec<Post>>;
    async fn list_by_author(&self, author_id: &str, limit: i64, offset: i64) -> AppResult<Vec<Post>>;
    async fn update(&self, post: &Post) -> AppResult<()>;
    async fn delete(&self, id: i64) -> AppResult<()>;
    /// Sets the archive flag together with the lifetime the reaper checks.
    async fn set_archived(
        &self,
        id: i64,
        archived: bool,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<()>;
    /// Archives every live post whose `expires_at` has passed.
    async fn archive_expired(&self, now: DateTime<Utc>) -> AppResult<usize>;
}

pub struct SqlitePostRepository {
    db: Database,
}

impl SqlitePostRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

const POST_COLUMNS: &str = "id, title, content, author_id, author_name, author_image, image_url, \
                            is_archive, created_at, expires_at";

fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    let created_at: String = row.get(8)?;
    let expires_at: Option<String> = row.get(9)?;
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        author_id: row.get(3)?,
        author_name: row.get(4)?,
        author_image: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        image_url: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        comments: Vec::new(),
        is_archive: row.get(7)?,
        created_at: from_db_time(8, &created_at)?,
        expires_at: expires_at.map(|t| from_db_time(9, &t)).transpose()?,
    })
}

fn db_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> AppError {
    AppError::from(e)
}

fn not_found_if_zero(affected: usize) -> AppResult<()> {
    if affected == 0 {
        Err(AppError::NotFound("Post".to_string()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn create(&self, post: &Post) -> AppResult<i64> {
        let post = post.clone();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO posts (title, content, author_id, author_name, author_image,
                                        image_url, is_archive, created_at, expires_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        post.title,
                        post.content,
                        post.author_id,
                        post.author_name,
                        post.author_image,
                        post.image_url,
                        post.is_archive,
                        to_db_time(&post.created_at),
                        post.expires_at.as_ref().map(to_db_time),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(db_err)
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Option<Post>> {
        self.db
            .connection()
            .call(move |conn| {
                let sql = format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS);
                Ok(conn.query_row(&sql, params![id], map_post).optional()?)
            })
            .await
            .map_err(db_err)
    }

    async fn list(&self, limit: i64, offset: i64, include_archived: bool) -> AppResult<Vec<Post>> {
        self.db
            .connection()
            .call(move |conn| {
                let filter = if include_archived { "" } else { "WHERE is_archive = 0" };
                let sql = format!(
                    "SELECT {} FROM posts {} ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
                    POST_COLUMNS, filter
                );
                let mut stmt = conn.prepare(&sql)?;
                let posts = stmt
                    .query_map(params![limit, offset], map_post)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(posts)
            })
            .await
            .map_err(db_err)
    }

    async fn list_by_author(&self, author_id: &str, limit: i64, offset: i64) -> AppResult<Vec<Post>> {
        let author_id = author_id.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM posts WHERE author_id = ?1
                     ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
                    POST_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let posts = stmt
                    .query_map(params![author_id, limit, offset], map_post)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(posts)
            })
            .await
            .map_err(db_err)
    }

    async fn update(&self, post: &Post) -> AppResult<()> {
        let post = post.clone();
        let affected = self
            .db
            .connection()
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE posts SET title = ?1, content = ?2, author_name = ?3,
                                      author_image = ?4, image_url = ?5
                     WHERE id = ?6",
                    params![
                        post.title,
                        post.content,
                        post.author_name,
                        post.author_image,
                        post.image_url,
                        post.id,
                    ],
                )?)
            })
            .await
            .map_err(db_err)?;
        not_found_if_zero(affected)
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let affected = self
            .db
            .connection()
            .call(move |conn| Ok(conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?))
            .await
            .map_err(db_err)?;
        not_found_if_zero(affected)
    }

    async fn set_archived(
        &self,
        id: i64,
        archived: bool,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let expires_at = expires_at.as_ref().map(to_db_time);
        let affected = self
            .db
            .connection()
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE posts SET is_archive = ?1, expires_at = ?2 WHERE id = ?3",
                    params![archived, expires_at, id],
                )?)
            })
            .await
            .map_err(db_err)?;
        not_found_if_zero(affected)
    }

    async fn archive_expired(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let now = to_db_time(&now);
        self.db
            .connection()
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE posts SET is_archive = 1
                     WHERE is_archive = 0 AND expires_at IS NOT NULL AND expires_at < ?1",
                    params![now],
                )?)
            })
            .await
            .map_err(db_err)
    }
}
