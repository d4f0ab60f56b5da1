use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::{CandidatePatch, CandidateRow, NewCandidate};
use crate::state::AppState;

/// POST /api/v1/candidates
pub async fn handle_create_candidate(
    State(state): State<AppState>,
    Json(req): Json<NewCandidate>,
) -> Result<(StatusCode, Json<CandidateRow>), AppError> {
    req.validate().map_err(AppError::Validation)?;
    let row = state.candidates.create(&req).await?;
    info!(candidate_id = %row.id, "Candidate created");
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<Vec<CandidateRow>>, AppError> {
    Ok(Json(state.candidates.list().await?))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidateRow>, AppError> {
    let row = state
        .candidates
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;
    Ok(Json(row))
}

/// PATCH /api/v1/candidates/:id
pub async fn handle_update_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<CandidatePatch>,
) -> Result<Json<CandidateRow>, AppError> {
    patch.validate().map_err(AppError::Validation)?;
    let row = state
        .candidates
        .update(id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;
    Ok(Json(row))
}

/// DELETE /api/v1/candidates/:id
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.candidates.delete(id).await? {
        return Err(AppError::NotFound(format!("Candidate {id} not found")));
    }
    info!(candidate_id = %id, "Candidate deleted");
    Ok(StatusCode::NO_CONTENT)
}
