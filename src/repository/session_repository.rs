//! Session persistence.

use crate::models::{AppError, AppResult, Session};
use crate::repository::database::{from_db_time, to_db_time, Database};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

/// Result of a delete. Both variants count as success so that racing
/// deleters of the same row never see a spurious failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyGone,
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> AppResult<()>;

    async fn get_by_id(&self, id: &str) -> AppResult<Option<Session>>;

    /// Overwrites name, gender, age and image. Returns `NotFound` when no
    /// row has the session's id.
    async fn update(&self, session: &Session) -> AppResult<()>;

    async fn delete(&self, id: &str) -> AppResult<DeleteOutcome>;

    /// Removes every row with `expires_at < now`; returns how many went.
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<usize>;
}

pub struct SqliteSessionRepository {
    db: Database,
}

impl SqliteSessionRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn map_session(row: &Row<'_>) -> rusqlite::Result<Session> {
    let created_at: String = row.get(5)?;
    let expires_at: String = row.get(6)?;
    Ok(Session {
        id: row.get(0)?,
        name: row.get(1)?,
        gender: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        age: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        image: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        created_at: from_db_time(5, &created_at)?,
        expires_at: from_db_time(6, &expires_at)?,
    })
}

fn nullable(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn create(&self, session: &Session) -> AppResult<()> {
        let session = session.clone();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO sessions (id, name, gender, age, image, created_at, expires_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        session.id,
                        session.name,
                        session.gender,
                        session.age,
                        nullable(&session.image),
                        to_db_time(&session.created_at),
                        to_db_time(&session.expires_at),
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| AppError::from(e))
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<Session>> {
        let id = id.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let session = conn
                    .query_row(
                        "SELECT id, name, gender, age, image, created_at, expires_at
                         FROM sessions WHERE id = ?1",
                        params![id],
                        map_session,
                    )
                    .optional()?;
                Ok(session)
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| AppError::from(e))
    }

    async fn update(&self, session: &Session) -> AppResult<()> {
        let session = session.clone();
        let affected = self
            .db
            .connection()
            .call(move |conn| {
                let affected = conn.execute(
                    "UPDATE sessions SET name = ?1, gender = ?2, age = ?3, image = ?4
                     WHERE id = ?5",
                    params![
                        session.name,
                        session.gender,
                        session.age,
                        nullable(&session.image),
                        session.id,
                    ],
                )?;
                Ok(affected)
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| AppError::from(e))?;

        if affected == 0 {
            return Err(AppError::NotFound("Session".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<DeleteOutcome> {
        let id = id.to_string();
        let affected = self
            .db
            .connection()
            .call(move |conn| Ok(conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?))
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| AppError::from(e))?;

        Ok(if affected == 0 {
            DeleteOutcome::AlreadyGone
        } else {
            DeleteOutcome::Deleted
        })
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let now = to_db_time(&now);
        self.db
            .connection()
            .call(move |conn| {
                Ok(conn.execute("DELETE FROM sessions WHERE expires_at < ?1", params![now])?)
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| AppError::from(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    async fn setup_repo() -> SqliteSessionRepository {
        let db = Database::open_in_memory().await.unwrap();
        SqliteSessionRepository::new(db)
    }

    fn make_session(id: &str, created_at: DateTime<Utc>) -> Session {
        let mut session = Session::new(id.to_string(), created_at, Duration::hours(24));
        session.name = "Rick Sanchez".to_string();
        session.gender = "Male".to_string();
        session.age = "Adult".to_string();
        session
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn create_and_get_session_roundtrips() {
        let repo = setup_repo().await;
        let session = make_session("s-1", t0());

        repo.create(&session).await.unwrap();
        let retrieved = repo.get_by_id("s-1").await.unwrap();

        assert_eq!(retrieved, Some(session));
    }

    #[tokio::test]
    async fn get_nonexistent_session_returns_none() {
        let repo = setup_repo().await;
        assert!(repo.get_by_id("no-such-session").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_id_is_a_persistence_failure() {
        let repo = setup_repo().await;
        let session = make_session("dup", t0());

        repo.create(&session).await.unwrap();
        let result = repo.create(&session).await;

        assert!(matches!(result, Err(AppError::PersistenceFailure(_))));
    }

    #[tokio::test]
    async fn update_leaves_expiry_untouched() {
        let repo = setup_repo().await;
        let session = make_session("s-upd", t0());
        repo.create(&session).await.unwrap();

        let mut changed = session.clone();
        changed.name = "Morty".to_string();
        changed.expires_at = t0() + Duration::days(30);
        repo.update(&changed).await.unwrap();

        let stored = repo.get_by_id("s-upd").await.unwrap().unwrap();
        assert_eq!(stored.name, "Morty");
        assert_eq!(stored.expires_at, session.expires_at);
    }

    #[tokio::test]
    async fn update_missing_row_is_not_found() {
        let repo = setup_repo().await;
        let result = repo.update(&make_session("ghost", t0())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repo = setup_repo().await;
        repo.create(&make_session("s-del", t0())).await.unwrap();

        assert_eq!(repo.delete("s-del").await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(repo.delete("s-del").await.unwrap(), DeleteOutcome::AlreadyGone);
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired_rows() {
        let repo = setup_repo().await;
        repo.create(&make_session("old", t0())).await.unwrap();
        repo.create(&make_session("fresh", t0() + Duration::hours(20))).await.unwrap();

        let now = t0() + Duration::hours(25);
        assert_eq!(repo.cleanup_expired(now).await.unwrap(), 1);
        assert_eq!(repo.cleanup_expired(now).await.unwrap(), 0);

        assert!(repo.get_by_id("old").await.unwrap().is_none());
        assert!(repo.get_by_id("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_image_is_stored_as_null() {
        let repo = setup_repo().await;
        repo.create(&make_session("no-avatar", t0())).await.unwrap();

        let is_null: bool = repo
            .db
            .connection()
            .call(|conn| {
                Ok(conn.query_row(
                    "SELECT image IS NULL FROM sessions WHERE id = 'no-avatar'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| AppError::from(e))
            .unwrap();

        assert!(is_null);
    }
}
