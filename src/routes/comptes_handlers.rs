use crate::error::{AppError, AppResult};
use crate::models::{Compte, CompteRequest};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use super::extractors::{CompteId, JsonBody};
use super::AppState;

/// List all comptes
pub async fn list_comptes(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Compte>>> {
    let comptes = state.store.list().await?;
    Ok(Json(comptes))
}

/// Get a single compte
pub async fn get_compte(
    State(state): State<Arc<AppState>>,
    CompteId(id): CompteId,
) -> AppResult<Json<Compte>> {
    let compte = state
        .store
        .get(id)
        .await?
        .ok_or(AppError::CompteNotFound(id))?;

    Ok(Json(compte))
}

/// Create a compte
pub async fn create_compte(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<CompteRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let compte = state
        .store
        .create(payload.into_new_compte(Utc::now().date_naive()))
        .await?;

    tracing::info!(id = compte.id, account_type = %compte.account_type, "Created compte");

    Ok((StatusCode::CREATED, Json(compte)))
}

/// Update a compte
pub async fn update_compte(
    State(state): State<Arc<AppState>>,
    CompteId(id): CompteId,
    JsonBody(payload): JsonBody<CompteRequest>,
) -> AppResult<Json<Compte>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let compte = state
        .store
        .update(id, payload.into_changes())
        .await?
        .ok_or(AppError::CompteNotFound(id))?;

    tracing::info!(id = compte.id, "Updated compte");

    Ok(Json(compte))
}

/// Delete a compte
pub async fn delete_compte(
    State(state): State<Arc<AppState>>,
    CompteId(id): CompteId,
) -> AppResult<StatusCode> {
    if !state.store.delete(id).await? {
        return Err(AppError::CompteNotFound(id));
    }

    tracing::info!(id, "Deleted compte");

    Ok(StatusCode::NO_CONTENT)
}
