//! Resolves the caller's session from the `session_id` cookie.
//!
//! Resolution never fails a request: a missing cookie, an unknown or
//! expired id and a store error all resolve to "no session". Handlers that
//! need an author call [`CurrentSession::require`].

use crate::handlers::AppState;
use crate::models::{AppError, AppResult, Session, SESSION_COOKIE};
use crate::services::SessionService;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;

pub async fn resolve_session(service: &SessionService, token: Option<&str>) -> Option<Session> {
    let token = token.map(str::trim).filter(|t| !t.is_empty())?;

    match service.get_session(token).await {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::debug!(session_id = token, error = %e, "session not resolved");
            None
        }
    }
}

/// The session attached to the current request, if any.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<Session>);

impl CurrentSession {
    pub fn require(self) -> AppResult<Session> {
        self.0.ok_or(AppError::Unauthorized)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

        Ok(CurrentSession(
            resolve_session(&state.sessions, token.as_deref()).await,
        ))
    }
}
