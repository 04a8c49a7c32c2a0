//! Partial updates for programs and milestones.

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use domain::models::{Milestone, MilestonePatch, Program, ProgramPatch};

use crate::app::AppState;
use crate::error::ApiError;

/// PATCH /api/v1/programs/:id
pub async fn patch_program(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<ProgramPatch>,
) -> Result<Json<Program>, ApiError> {
    patch.validate()?;
    if patch.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }
    Ok(Json(state.store.patch_program(id, &patch).await?))
}

/// PATCH /api/v1/milestones/:id
pub async fn patch_milestone(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<MilestonePatch>,
) -> Result<Json<Milestone>, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }
    Ok(Json(state.store.patch_milestone(id, &patch).await?))
}
