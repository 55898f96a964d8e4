use crate::models::{AppError, AppResult, Comment};
use crate::repository::database::{from_db_time, to_db_time, Database};
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: &Comment) -> AppResult<i64>;
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Comment>>;
    /// Comments of one post, oldest first.
    async fn list_by_post(&self, post_id: i64) -> AppResult<Vec<Comment>>;
    async fn update(&self, comment: &Comment) -> AppResult<()>;
    async fn delete(&self, id: i64) -> AppResult<()>;
}

pub struct SqliteCommentRepository {
    db: Database,
}

impl SqliteCommentRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

const COMMENT_COLUMNS: &str = "id, post_id, title, content, author_id, author_name, author_image, \
                               image_url, reply_to_comment_id, created_at";

fn map_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    let created_at: String = row.get(9)?;
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        author_id: row.get(4)?,
        author_name: row.get(5)?,
        author_image: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        image_url: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        reply_to_comment_id: row.get(8)?,
        created_at: from_db_time(9, &created_at)?,
    })
}

fn db_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> AppError {
    AppError::from(e)
}

#[async_trait]
impl CommentRepository for SqliteCommentRepository {
    async fn create(&self, comment: &Comment) -> AppResult<i64> {
        let comment = comment.clone();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO comments (post_id, title, content, author_id, author_name,
                                           author_image, image_url, reply_to_comment_id, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        comment.post_id,
                        comment.title,
                        comment.content,
                        comment.author_id,
                        comment.author_name,
                        comment.author_image,
                        comment.image_url,
                        comment.reply_to_comment_id,
                        to_db_time(&comment.created_at),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(db_err)
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Option<Comment>> {
        self.db
            .connection()
            .call(move |conn| {
                let sql = format!("SELECT {} FROM comments WHERE id = ?1", COMMENT_COLUMNS);
                Ok(conn.query_row(&sql, params![id], map_comment).optional()?)
            })
            .await
            .map_err(db_err)
    }

    async fn list_by_post(&self, post_id: i64) -> AppResult<Vec<Comment>> {
        self.db
            .connection()
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM comments WHERE post_id = ?1 ORDER BY created_at ASC, id ASC",
                    COMMENT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let comments = stmt
                    .query_map(params![post_id], map_comment)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(comments)
            })
            .await
            .map_err(db_err)
    }

    async fn update(&self, comment: &Comment) -> AppResult<()> {
        let comment = comment.clone();
        let affected = self
            .db
            .connection()
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE comments SET title = ?1, content = ?2, author_name = ?3,
                                         author_image = ?4, image_url = ?5
                     WHERE id = ?6",
                    params![
                        comment.title,
                        comment.content,
                        comment.author_name,
                        comment.author_image,
                        comment.image_url,
                        comment.id,
                    ],
                )?)
            })
            .await
            .map_err(db_err)?;

        if affected == 0 {
            return Err(AppError::NotFound("Comment".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let affected = self
            .db
            .connection()
            .call(move |conn| Ok(conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?))
            .await
            .map_err(db_err)?;

        if affected == 0 {
            return Err(AppError::NotFound("Comment".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Post;
    use crate::repository::{PostRepository, SqlitePostRepository};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    async fn setup() -> (SqlitePostRepository, SqliteCommentRepository, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let posts = SqlitePostRepository::new(db.clone());
        let post_id = posts
            .create(&Post {
                id: 0,
                title: "t".to_string(),
                content: "c".to_string(),
                author_id: "a".to_string(),
                author_name: "A".to_string(),
                author_image: String::new(),
                image_url: String::new(),
                comments: Vec::new(),
                is_archive: false,
                created_at: t0(),
                expires_at: None,
            })
            .await
            .unwrap();
        (posts, SqliteCommentRepository::new(db), post_id)
    }

    fn make_comment(post_id: i64, at: DateTime<Utc>, reply_to: Option<i64>) -> Comment {
        Comment {
            id: 0,
            post_id,
            title: "re".to_string(),
            content: "nice".to_string(),
            author_id: "b".to_string(),
            author_name: "B".to_string(),
            author_image: String::new(),
            image_url: String::new(),
            reply_to_comment_id: reply_to,
            created_at: at,
        }
    }

    #[tokio::test]
    async fn comments_list_oldest_first_with_replies() {
        let (_posts, repo, post_id) = setup().await;
        let parent = repo.create(&make_comment(post_id, t0(), None)).await.unwrap();
        let reply = repo
            .create(&make_comment(post_id, t0() + Duration::seconds(5), Some(parent)))
            .await
            .unwrap();

        let comments = repo.list_by_post(post_id).await.unwrap();
        assert_eq!(comments.iter().map(|c| c.id).collect::<Vec<_>>(), vec![parent, reply]);
        assert_eq!(comments[1].reply_to_comment_id, Some(parent));
    }

    #[tokio::test]
    async fn deleting_post_cascades_to_comments() {
        let (posts, repo, post_id) = setup().await;
        let id = repo.create(&make_comment(post_id, t0(), None)).await.unwrap();

        posts.delete(post_id).await.unwrap();

        assert!(repo.get_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn comment_on_missing_post_violates_foreign_key() {
        let (_posts, repo, _post_id) = setup().await;
        let result = repo.create(&make_comment(9_999, t0(), None)).await;
        assert!(matches!(result, Err(AppError::PersistenceFailure(_))));
    }

    #[tokio::test]
    async fn delete_missing_comment_is_not_found() {
        let (_posts, repo, _post_id) = setup().await;
        assert!(matches!(repo.delete(7).await, Err(AppError::NotFound(_))));
    }
}
