use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::handlers::AppState;
use crate::models::{AppResult, CleanupResponse, Session, UpdateSessionRequest, SESSION_COOKIE};
use crate::utils::{validate_gender, validate_required};

pub fn session_cookie(session_id: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, session_id, max_age_secs
    )
}

pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Create a new anonymous session
#[utoipa::path(
    post,
    path = "/api/sessions",
    responses(
        (status = 201, description = "Session created, cookie set", body = Session),
        (status = 500, description = "Session could not be persisted")
    ),
    tag = "Sessions"
)]
pub async fn create_session(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let session = state.sessions.create_session().await?;
    let cookie = session_cookie(&session.id, state.sessions.ttl().num_seconds());

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(session),
    ))
}

/// Fetch a session by id
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Active session", body = Session),
        (status = 404, description = "Session not found or expired")
    ),
    tag = "Sessions"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Session>> {
    let session = state.sessions.get_session(&id).await?;
    Ok(Json(session))
}

/// Rename a session or change its gender and age
#[utoipa::path(
    put,
    path = "/api/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    request_body = UpdateSessionRequest,
    responses(
        (status = 200, description = "Session updated", body = Session),
        (status = 400, description = "Invalid name or gender"),
        (status = 404, description = "Session not found or expired")
    ),
    tag = "Sessions"
)]
pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSessionRequest>,
) -> AppResult<Json<Session>> {
    validate_required("name", &request.name)?;
    validate_gender(request.gender.as_deref())?;

    let mut session = state.sessions.get_session(&id).await?;
    session.name = request.name;
    if let Some(gender) = request.gender.filter(|g| !g.is_empty()) {
        session.gender = gender;
    }
    if let Some(age) = request.age.filter(|a| !a.is_empty()) {
        session.age = age;
    }

    let updated = state.sessions.update_session(&session).await?;
    Ok(Json(updated))
}

/// Delete a session
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "Session not found")
    ),
    tag = "Sessions"
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.sessions.delete_session(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove every expired session
#[utoipa::path(
    post,
    path = "/api/sessions/cleanup",
    responses(
        (status = 200, description = "Expired sessions removed", body = CleanupResponse)
    ),
    tag = "Sessions"
)]
pub async fn cleanup_sessions(State(state): State<AppState>) -> AppResult<Json<CleanupResponse>> {
    let removed = state.sessions.cleanup_expired_sessions().await?;
    Ok(Json(CleanupResponse { removed }))
}

/// Clear the session cookie
#[utoipa::path(
    post,
    path = "/api/sessions/logout",
    responses((status = 200, description = "Cookie cleared")),
    tag = "Sessions"
)]
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(json!({ "status": "logged out" })),
    )
}
