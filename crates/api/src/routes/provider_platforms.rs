//! Provider platform registry handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use domain::models::{CreateProviderPlatformRequest, ProviderPlatform, ProviderPlatformPatch};
use persistence::repositories::ProviderPlatformRepository;
use shared::pagination::{PageParams, Paginated, PaginationMeta};

use crate::app::AppState;
use crate::error::ApiError;

/// GET /api/v1/provider-platforms?page=&per_page=
pub async fn list_provider_platforms(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<ProviderPlatform>>, ApiError> {
    let params = params.normalized();
    let (rows, total) = ProviderPlatformRepository::new(state.pool.clone())
        .list(params.limit(), params.offset())
        .await?;
    let data = rows
        .into_iter()
        .map(ProviderPlatform::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(Paginated {
        data,
        meta: PaginationMeta::new(params, total),
    }))
}

/// POST /api/v1/provider-platforms
pub async fn create_provider_platform(
    State(state): State<AppState>,
    Json(request): Json<CreateProviderPlatformRequest>,
) -> Result<(StatusCode, Json<ProviderPlatform>), ApiError> {
    request.validate()?;
    request.check_credentials().map_err(ApiError::Validation)?;

    let entity = ProviderPlatformRepository::new(state.pool.clone())
        .create(&request)
        .await?;
    let platform = ProviderPlatform::try_from(entity)?;

    tracing::info!(
        provider_platform_id = platform.id,
        platform_type = platform.platform_type.as_str(),
        "Provider platform registered"
    );
    Ok((StatusCode::CREATED, Json(platform)))
}

/// GET /api/v1/provider-platforms/:id
pub async fn get_provider_platform(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProviderPlatform>, ApiError> {
    let entity = ProviderPlatformRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Provider platform {} not found", id)))?;
    Ok(Json(ProviderPlatform::try_from(entity)?))
}

/// PATCH /api/v1/provider-platforms/:id
pub async fn patch_provider_platform(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<ProviderPlatformPatch>,
) -> Result<Json<ProviderPlatform>, ApiError> {
    patch.validate()?;
    if patch.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }
    let platform = state.store.patch_provider_platform(id, &patch).await?;

    tracing::info!(
        provider_platform_id = platform.id,
        state = platform.state.as_str(),
        "Provider platform updated"
    );
    Ok(Json(platform))
}

/// DELETE /api/v1/provider-platforms/:id
pub async fn delete_provider_platform(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = ProviderPlatformRepository::new(state.pool.clone())
        .delete(id)
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("Provider platform {} not found", id)));
    }

    tracing::info!(provider_platform_id = id, "Provider platform deleted");
    Ok(StatusCode::NO_CONTENT)
}
