use crate::models::{generate_session_id, AppError, AppResult, Session};
use crate::repository::{DeleteOutcome, SessionRepository};
use crate::services::{AvatarPipeline, CharacterSource, Clock};
use chrono::{Duration, SubsecRound};
use std::sync::Arc;

/// Owns the session lifecycle: creation with character enrichment,
/// expiry-on-read, edits and bulk cleanup.
#[derive(Clone)]
pub struct SessionService {
    repository: Arc<dyn SessionRepository>,
    characters: Arc<dyn CharacterSource>,
    avatars: AvatarPipeline,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionService {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        characters: Arc<dyn CharacterSource>,
        avatars: AvatarPipeline,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            repository,
            characters,
            avatars,
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creates and persists a new session. Catalog and avatar failures only
    /// degrade the identity; a persistence failure is returned.
    pub async fn create_session(&self) -> AppResult<Session> {
        let now = self.clock.now().trunc_subsecs(6);
        let mut session = Session::new(generate_session_id(), now, self.ttl);

        match self.characters.fetch_random().await {
            Ok(character) => {
                session.name = character.name.clone();
                session.gender = character.gender.clone();
                session.age = character.age().to_string();
                session.image = self.avatars.resolve(&session.id, &character.image).await;
            }
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "character enrichment failed");
            }
        }
        session.normalize_identity();

        self.repository
            .create(&session)
            .await
            .map_err(|e| e.context("failed to create session in database"))?;

        tracing::info!(session_id = %session.id, name = %session.name, "session created");
        Ok(session)
    }

    /// Returns the session if it is still active. An expired row is deleted
    /// on the way out and reported as `SessionExpired`.
    pub async fn get_session(&self, id: &str) -> AppResult<Session> {
        let session = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session".to_string()))?;

        if session.is_expired_at(self.clock.now()) {
            if let Err(e) = self.repository.delete(id).await {
                tracing::warn!(session_id = id, error = %e, "failed to delete expired session");
            }
            return Err(AppError::SessionExpired);
        }

        Ok(session)
    }

    /// Overwrites the identity fields and avatar. Id and timestamps of the
    /// stored row are kept.
    pub async fn update_session(&self, session: &Session) -> AppResult<Session> {
        let mut stored = self
            .repository
            .get_by_id(&session.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session".to_string()))?;

        stored.name = session.name.clone();
        stored.gender = session.gender.clone();
        stored.age = session.age.clone();
        stored.image = session.image.clone();
        stored.normalize_identity();

        self.repository.update(&stored).await?;
        tracing::debug!(session_id = %stored.id, "session updated");
        Ok(stored)
    }

    pub async fn delete_session(&self, id: &str) -> AppResult<()> {
        if self.repository.get_by_id(id).await?.is_none() {
            return Err(AppError::NotFound("Session".to_string()));
        }

        match self.repository.delete(id).await? {
            DeleteOutcome::Deleted => tracing::debug!(session_id = id, "session deleted"),
            DeleteOutcome::AlreadyGone => {
                tracing::debug!(session_id = id, "session removed concurrently")
            }
        }
        Ok(())
    }

    /// Removes every expired session and returns how many were removed.
    pub async fn cleanup_expired_sessions(&self) -> AppResult<usize> {
        let removed = self.repository.cleanup_expired(self.clock.now()).await?;
        if removed > 0 {
            tracing::info!(removed, "expired sessions cleaned up");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DEFAULT_AGE, DEFAULT_GENDER, DEFAULT_NAME};
    use crate::repository::{Database, SqliteSessionRepository};
    use crate::services::testing::{FakeCatalog, FakeFetcher, MemoryStore, RICK_IMAGE};
    use crate::services::ManualClock;
    use chrono::{DateTime, TimeZone, Utc};

    struct Harness {
        service: SessionService,
        repo: Arc<SqliteSessionRepository>,
        clock: Arc<ManualClock>,
        store: Arc<MemoryStore>,
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    async fn harness(catalog: FakeCatalog, fetcher: FakeFetcher, store: MemoryStore) -> Harness {
        let db = Database::open_in_memory().await.unwrap();
        let repo = Arc::new(SqliteSessionRepository::new(db));
        let clock = Arc::new(ManualClock::new(t0()));
        let store = Arc::new(store);
        let avatars = AvatarPipeline::new(Arc::new(fetcher), store.clone());
        let service = SessionService::new(
            repo.clone(),
            Arc::new(catalog),
            avatars,
            clock.clone(),
            Duration::hours(24),
        );
        Harness {
            service,
            repo,
            clock,
            store,
        }
    }

    async fn healthy() -> Harness {
        harness(
            FakeCatalog::rick(),
            FakeFetcher::serving("image/jpeg"),
            MemoryStore::default(),
        )
        .await
    }

    #[tokio::test]
    async fn create_enriches_from_catalog_and_stores_avatar() {
        let h = healthy().await;

        let session = h.service.create_session().await.unwrap();

        assert_eq!(session.name, "Rick Sanchez");
        assert_eq!(session.gender, "Male");
        assert_eq!(session.age, "Adult");
        assert_eq!(
            session.image,
            format!("http://store.test/images/avatars/{}-character-image.jpeg", session.id)
        );
        assert_eq!(session.expires_at, t0() + Duration::hours(24));
        assert_eq!(h.store.len(), 1);
        assert_eq!(h.repo.get_by_id(&session.id).await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn create_uses_remote_url_when_store_rejects_upload() {
        let h = harness(
            FakeCatalog::rick(),
            FakeFetcher::serving("image/jpeg"),
            MemoryStore::failing(),
        )
        .await;

        let session = h.service.create_session().await.unwrap();

        assert_eq!(session.image, RICK_IMAGE);
    }

    #[tokio::test]
    async fn create_survives_catalog_and_store_outage() {
        let h = harness(FakeCatalog::down(), FakeFetcher::failing(), MemoryStore::failing()).await;

        let session = h.service.create_session().await.unwrap();

        assert_eq!(session.name, DEFAULT_NAME);
        assert_eq!(session.gender, DEFAULT_GENDER);
        assert_eq!(session.age, DEFAULT_AGE);
        assert_eq!(session.image, "");
        assert!(h.repo.get_by_id(&session.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_fills_blank_catalog_fields_with_sentinels() {
        let mut catalog = FakeCatalog::rick();
        if let Some(c) = catalog.character.as_mut() {
            c.name = String::new();
            c.gender = String::new();
            c.species = "Cronenberg".to_string();
        }
        let h = harness(catalog, FakeFetcher::serving("image/png"), MemoryStore::default()).await;

        let session = h.service.create_session().await.unwrap();

        assert_eq!(session.name, DEFAULT_NAME);
        assert_eq!(session.gender, DEFAULT_GENDER);
        assert_eq!(session.age, "Unknown");
    }

    #[tokio::test]
    async fn get_missing_session_is_not_found() {
        let h = healthy().await;
        let result = h.service.get_session("nope").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn get_does_not_extend_expiry() {
        let h = healthy().await;
        let created = h.service.create_session().await.unwrap();

        h.clock.advance(Duration::hours(23));
        let fetched = h.service.get_session(&created.id).await.unwrap();

        assert_eq!(fetched.expires_at, created.expires_at);
    }

    #[tokio::test]
    async fn get_expired_session_deletes_the_row() {
        let h = healthy().await;
        let created = h.service.create_session().await.unwrap();

        h.clock.advance(Duration::hours(24) + Duration::seconds(1));

        assert!(matches!(
            h.service.get_session(&created.id).await,
            Err(AppError::SessionExpired)
        ));
        assert!(h.repo.get_by_id(&created.id).await.unwrap().is_none());
        assert!(matches!(
            h.service.get_session(&created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_gets_on_expired_session_all_miss() {
        let h = healthy().await;
        let created = h.service.create_session().await.unwrap();
        h.clock.advance(Duration::hours(30));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = h.service.clone();
                let id = created.id.clone();
                tokio::spawn(async move { service.get_session(&id).await })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.unwrap_err().is_not_found());
        }
        assert!(h.repo.get_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_overwrites_identity_but_not_timestamps() {
        let h = healthy().await;
        let created = h.service.create_session().await.unwrap();

        let mut edit = created.clone();
        edit.name = "Pickle Rick".to_string();
        edit.gender = String::new();
        edit.created_at = t0() + Duration::days(3);
        edit.expires_at = t0() + Duration::days(30);

        let updated = h.service.update_session(&edit).await.unwrap();

        assert_eq!(updated.name, "Pickle Rick");
        assert_eq!(updated.gender, DEFAULT_GENDER);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.expires_at, created.expires_at);
        assert_eq!(h.repo.get_by_id(&created.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn update_and_delete_unknown_id_are_not_found() {
        let h = healthy().await;
        let ghost = Session::new("ghost".to_string(), t0(), Duration::hours(1));

        assert!(matches!(
            h.service.update_session(&ghost).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            h.service.delete_session("ghost").await,
            Err(AppError::NotFound(_))
        ));
        assert!(h.repo.get_by_id("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_session() {
        let h = healthy().await;
        let created = h.service.create_session().await.unwrap();

        h.service.delete_session(&created.id).await.unwrap();

        assert!(h.repo.get_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let h = healthy().await;
        h.service.create_session().await.unwrap();
        h.service.create_session().await.unwrap();
        h.clock.advance(Duration::hours(12));
        let survivor = h.service.create_session().await.unwrap();

        h.clock.advance(Duration::hours(13));

        assert_eq!(h.service.cleanup_expired_sessions().await.unwrap(), 2);
        assert_eq!(h.service.cleanup_expired_sessions().await.unwrap(), 0);
        assert!(h.service.get_session(&survivor.id).await.is_ok());
    }

    #[tokio::test]
    async fn lifecycle_over_a_day() {
        let h = healthy().await;
        let created = h.service.create_session().await.unwrap();

        h.clock.set(t0() + Duration::hours(1));
        let seen = h.service.get_session(&created.id).await.unwrap();
        assert_eq!(seen.id, created.id);
        assert_eq!(seen.name, created.name);
        assert_eq!(seen.expires_at, t0() + Duration::hours(24));

        h.clock.set(t0() + Duration::hours(25));
        assert!(h.service.get_session(&created.id).await.unwrap_err().is_not_found());
        assert_eq!(h.service.cleanup_expired_sessions().await.unwrap(), 0);
        assert!(h.repo.get_by_id(&created.id).await.unwrap().is_none());
    }
}
