//! SQLite connection handle and schema bootstrap.
//!
//! Every statement runs on the single background thread owned by
//! `tokio_rusqlite::Connection`; clones of [`Database`] share it.

use crate::models::{AppError, AppResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use std::path::Path;
use std::sync::Arc;
use tokio_rusqlite::Connection;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        gender TEXT,
        age TEXT,
        image TEXT,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);

    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        author_id TEXT NOT NULL,
        author_name TEXT NOT NULL,
        author_image TEXT,
        image_url TEXT,
        is_archive INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        expires_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_posts_author_id ON posts(author_id);
    CREATE INDEX IF NOT EXISTS idx_posts_is_archive ON posts(is_archive);

    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        author_id TEXT NOT NULL,
        author_name TEXT NOT NULL,
        author_image TEXT,
        image_url TEXT,
        reply_to_comment_id INTEGER REFERENCES comments(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments(post_id);
";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Connection>,
}

impl Database {
    /// Opens (or creates) the database file and applies the schema.
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::PersistenceFailure(format!("failed to create database directory: {}", e))
            })?;
        }

        let conn = Connection::open(&path).await.map_err(|e| {
            AppError::PersistenceFailure(format!("failed to open {}: {}", path.display(), e))
        })?;

        let db = Self {
            conn: Arc::new(conn),
        };
        db.initialize(true).await?;
        tracing::info!(path = %path.display(), "database ready");
        Ok(db)
    }

    pub async fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().await.map_err(|e| {
            AppError::PersistenceFailure(format!("failed to open in-memory database: {}", e))
        })?;

        let db = Self {
            conn: Arc::new(conn),
        };
        db.initialize(false).await?;
        Ok(db)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn initialize(&self, wal: bool) -> AppResult<()> {
        self.conn
            .call(move |conn| {
                if wal {
                    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                }
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| {
                AppError::from(e).context("failed to initialize schema")
            })
    }
}

/// Fixed-width UTC text so that string order matches time order.
pub fn to_db_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_db_time(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
