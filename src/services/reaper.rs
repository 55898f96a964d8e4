//! Periodic background sweep.

use crate::services::{PostService, SessionService};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Runs one sweep: expired sessions are removed and stale posts archived.
/// Failures are logged and never stop the next sweep.
pub async fn sweep(sessions: &SessionService, posts: &PostService) {
    match sessions.cleanup_expired_sessions().await {
        Ok(removed) => tracing::debug!(removed, "session sweep finished"),
        Err(e) => tracing::error!(error = %e, "session sweep failed"),
    }

    match posts.archive_stale_posts().await {
        Ok(archived) => tracing::debug!(archived, "post sweep finished"),
        Err(e) => tracing::error!(error = %e, "post sweep failed"),
    }
}

pub fn spawn_reaper(sessions: SessionService, posts: PostService, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = every.as_secs(), "reaper started");

        loop {
            ticker.tick().await;
            sweep(&sessions, &posts).await;
        }
    })
}
