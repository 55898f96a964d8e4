use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::handlers::AppState;
use crate::models::{AppResult, Character};

/// Fetch one random character from the catalog
#[utoipa::path(
    get,
    path = "/api/characters/random",
    responses(
        (status = 200, description = "A random character", body = Character),
        (status = 502, description = "Catalog unavailable")
    ),
    tag = "Characters"
)]
pub async fn random_character(State(state): State<AppState>) -> AppResult<Json<Character>> {
    let character = state.characters.fetch_random().await?;
    Ok(Json(character))
}

/// List every character in the catalog
#[utoipa::path(
    get,
    path = "/api/characters",
    responses(
        (status = 200, description = "All characters", body = [Character]),
        (status = 502, description = "Catalog unavailable")
    ),
    tag = "Characters"
)]
pub async fn list_characters(State(state): State<AppState>) -> AppResult<Json<Vec<Character>>> {
    let characters = state.characters.fetch_all().await?;
    tracing::debug!(count = characters.len(), "catalog listed");
    Ok(Json(characters))
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up")),
    tag = "Health"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
