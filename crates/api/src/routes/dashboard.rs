//! User dashboard handler.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use domain::models::UserDashboard;
use domain::services::assemble_dashboard;

use crate::app::AppState;
use crate::error::ApiError;

use super::ensure_user;

/// GET /api/v1/users/:user_id/dashboard
pub async fn get_user_dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserDashboard>, ApiError> {
    ensure_user(&state, user_id).await?;
    let dashboard = assemble_dashboard(
        state.store.as_ref(),
        user_id,
        Utc::now(),
        state.config.import.enrollment_fallback_cap,
    )
    .await?;
    Ok(Json(dashboard))
}
