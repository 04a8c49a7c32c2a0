//! Provider login (identity mapping) handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use domain::models::{CreateMappingRequest, MappingUpdate, ProviderUserMapping};
use domain::services::{IdentityMapper, SyncStore};
use persistence::repositories::ProviderUserMappingRepository;

use crate::app::AppState;
use crate::error::ApiError;

use super::ensure_user;

/// GET /api/v1/users/:user_id/logins
pub async fn list_logins(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<ProviderUserMapping>>, ApiError> {
    ensure_user(&state, user_id).await?;
    let mappings = ProviderUserMappingRepository::new(state.pool.clone())
        .list_for_user(user_id)
        .await?
        .into_iter()
        .map(ProviderUserMapping::from)
        .collect();
    Ok(Json(mappings))
}

/// Links a user to an account on a provider platform.
///
/// POST /api/v1/users/:user_id/logins
pub async fn create_login(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<CreateMappingRequest>,
) -> Result<(StatusCode, Json<ProviderUserMapping>), ApiError> {
    request.validate()?;
    ensure_user(&state, user_id).await?;

    let mapping = ProviderUserMappingRepository::new(state.pool.clone())
        .create(&request.into_new_mapping(user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(mapping.into())))
}

/// PUT /api/v1/users/:user_id/logins/:provider_platform_id
pub async fn update_login(
    State(state): State<AppState>,
    Path((user_id, provider_platform_id)): Path<(i64, i64)>,
    Json(update): Json<MappingUpdate>,
) -> Result<Json<ProviderUserMapping>, ApiError> {
    if update.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }
    let store: Arc<dyn SyncStore> = state.store.clone();
    let mapper = IdentityMapper::new(store, state.config.import.default_email_domain.clone());
    let mapping = mapper
        .update_mapping(user_id, provider_platform_id, &update)
        .await?;
    Ok(Json(mapping))
}

/// DELETE /api/v1/users/:user_id/logins/:provider_platform_id
pub async fn delete_login(
    State(state): State<AppState>,
    Path((user_id, provider_platform_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let deleted = ProviderUserMappingRepository::new(state.pool.clone())
        .delete(user_id, provider_platform_id)
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!(
            "User {} has no login on provider platform {}",
            user_id, provider_platform_id
        )));
    }
    tracing::info!(user_id, provider_platform_id, "Provider login removed");
    Ok(StatusCode::NO_CONTENT)
}
