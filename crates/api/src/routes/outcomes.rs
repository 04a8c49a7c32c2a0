//! User outcome handlers.
//!
//! An outcome closes a program for a user: it drops out of the dashboard's
//! recent programs and enrollments.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use domain::models::{CreateOutcomeRequest, Outcome, OutcomeFilter, OutcomePatch};
use persistence::repositories::OutcomeRepository;
use shared::pagination::{PageParams, Paginated, PaginationMeta};

use crate::app::AppState;
use crate::error::ApiError;

use super::ensure_user;

/// GET /api/v1/users/:user_id/outcomes?type=&page=&per_page=
pub async fn list_outcomes(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<PageParams>,
    Query(filter): Query<OutcomeFilter>,
) -> Result<Json<Paginated<Outcome>>, ApiError> {
    ensure_user(&state, user_id).await?;
    let params = params.normalized();
    let (rows, total) = OutcomeRepository::new(state.pool.clone())
        .list_for_user(user_id, filter.outcome_type, params.limit(), params.offset())
        .await?;
    let data = rows
        .into_iter()
        .map(Outcome::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(Paginated {
        data,
        meta: PaginationMeta::new(params, total),
    }))
}

/// POST /api/v1/users/:user_id/outcomes
pub async fn create_outcome(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<CreateOutcomeRequest>,
) -> Result<(StatusCode, Json<Outcome>), ApiError> {
    request.validate()?;
    ensure_user(&state, user_id).await?;

    let entity = OutcomeRepository::new(state.pool.clone())
        .create(user_id, &request)
        .await?;
    let outcome = Outcome::try_from(entity)?;
    tracing::info!(
        user_id,
        program_id = outcome.program_id,
        outcome_type = outcome.outcome_type.as_str(),
        "Outcome recorded"
    );
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// PATCH /api/v1/users/:user_id/outcomes/:outcome_id
pub async fn patch_outcome(
    State(state): State<AppState>,
    Path((user_id, outcome_id)): Path<(i64, i64)>,
    Json(patch): Json<OutcomePatch>,
) -> Result<Json<Outcome>, ApiError> {
    patch.validate()?;
    if patch.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }
    Ok(Json(state.store.patch_outcome(user_id, outcome_id, &patch).await?))
}

/// DELETE /api/v1/users/:user_id/outcomes/:outcome_id
pub async fn delete_outcome(
    State(state): State<AppState>,
    Path((user_id, outcome_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let deleted = OutcomeRepository::new(state.pool.clone())
        .delete(user_id, outcome_id)
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!(
            "Outcome {} not found for user {}",
            outcome_id, user_id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
