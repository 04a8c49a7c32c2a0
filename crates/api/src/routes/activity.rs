//! Activity handlers: daily aggregation, listings and manual ingestion.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use domain::models::{Activity, CreateActivityRequest, DailyActivity, DailyActivityQuery};
use domain::services::{daily_activity, SyncStore};
use persistence::repositories::ActivityRepository;
use shared::pagination::{PageParams, Paginated, PaginationMeta};

use crate::app::AppState;
use crate::error::ApiError;

use super::ensure_user;

/// Per-day totals with quartiles for a calendar year, or the trailing 365
/// days when `year` is absent.
///
/// GET /api/v1/users/:user_id/daily-activity?year=
pub async fn get_daily_activity(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<DailyActivityQuery>,
) -> Result<Json<Vec<DailyActivity>>, ApiError> {
    query.validate()?;
    ensure_user(&state, user_id).await?;
    let days = daily_activity(state.store.as_ref(), user_id, query.year, Utc::now()).await?;
    Ok(Json(days))
}

/// GET /api/v1/users/:user_id/activity?page=&per_page=
pub async fn list_user_activity(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<Activity>>, ApiError> {
    let params = params.normalized();
    let (rows, total) = ActivityRepository::new(state.pool.clone())
        .list_for_user(user_id, params.limit(), params.offset())
        .await?;
    Ok(Json(Paginated {
        data: rows.into_iter().map(Activity::from).collect(),
        meta: PaginationMeta::new(params, total),
    }))
}

/// Records a reported cumulative total; the stored row carries the delta.
///
/// POST /api/v1/users/:user_id/activity
pub async fn create_user_activity(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<Activity>), ApiError> {
    request.validate()?;
    ensure_user(&state, user_id).await?;
    let activity = state.store.ingest_activity(request.into_ingest(user_id)).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// GET /api/v1/programs/:id/activity?page=&per_page=
pub async fn list_program_activity(
    State(state): State<AppState>,
    Path(program_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<Activity>>, ApiError> {
    if state.store.find_program(program_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Program {} not found", program_id)));
    }
    let params = params.normalized();
    let (rows, total) = ActivityRepository::new(state.pool.clone())
        .list_for_program(program_id, params.limit(), params.offset())
        .await?;
    Ok(Json(Paginated {
        data: rows.into_iter().map(Activity::from).collect(),
        meta: PaginationMeta::new(params, total),
    }))
}
