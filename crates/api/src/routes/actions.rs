//! Import trigger handlers.
//!
//! Each import runs on its own task while holding the provider's lock. If the
//! client goes away the handler future is dropped, which cancels the task; it
//! stops before its next record and keeps what it already committed.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tokio_util::sync::CancellationToken;

use domain::models::{FullSyncReport, PhaseReport, ProviderPlatform, SyncPhase};
use domain::services::{ProviderSync, SyncStore};
use persistence::repositories::ProviderPlatformRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_import_duration;
use crate::middleware::RequestId;

/// POST /api/v1/actions/provider-platforms/:id/import-users
pub async fn import_users(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(request_id): Extension<RequestId>,
) -> Result<Json<PhaseReport>, ApiError> {
    run_phase(state, id, request_id, SyncPhase::Users).await.map(Json)
}

/// POST /api/v1/actions/provider-platforms/:id/import-programs
pub async fn import_programs(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(request_id): Extension<RequestId>,
) -> Result<Json<PhaseReport>, ApiError> {
    run_phase(state, id, request_id, SyncPhase::Programs).await.map(Json)
}

/// POST /api/v1/actions/provider-platforms/:id/import-milestones
pub async fn import_milestones(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(request_id): Extension<RequestId>,
) -> Result<Json<PhaseReport>, ApiError> {
    run_phase(state, id, request_id, SyncPhase::Milestones).await.map(Json)
}

/// POST /api/v1/actions/provider-platforms/:id/import-activity
pub async fn import_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(request_id): Extension<RequestId>,
) -> Result<Json<PhaseReport>, ApiError> {
    run_phase(state, id, request_id, SyncPhase::Activity).await.map(Json)
}

/// Runs all phases in order.
///
/// POST /api/v1/actions/provider-platforms/:id/sync
///
/// Responds 200 with the phases that ran; an aborted phase is named in
/// `aborted_phase` and `error`.
pub async fn sync_provider(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(request_id): Extension<RequestId>,
) -> Result<Json<FullSyncReport>, ApiError> {
    let started = Instant::now();
    let lock = state.provider_locks.try_acquire(id)?;
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let sync = open_sync(&state, id, request_id, cancel, None).await?;

    let report = tokio::spawn(async move {
        let _lock = lock;
        sync.full_sync().await
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Import task failed: {}", e)))?;

    let result = if report.aborted_phase.is_some() {
        "aborted"
    } else {
        "ok"
    };
    record_import_duration("full", result, started.elapsed().as_secs_f64());
    Ok(Json(report))
}

async fn run_phase(
    state: AppState,
    provider_platform_id: i64,
    request_id: RequestId,
    phase: SyncPhase,
) -> Result<PhaseReport, ApiError> {
    let started = Instant::now();
    let lock = state.provider_locks.try_acquire(provider_platform_id)?;
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let sync = open_sync(&state, provider_platform_id, request_id, cancel, Some(phase)).await?;

    let result = tokio::spawn(async move {
        let _lock = lock;
        sync.run_phase(phase).await
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Import task failed: {}", e)))?;

    let label = if result.is_ok() { "ok" } else { "aborted" };
    record_import_duration(phase.as_str(), label, started.elapsed().as_secs_f64());
    Ok(result?)
}

/// Loads the platform, connects its gateway and builds the orchestrator.
async fn open_sync(
    state: &AppState,
    provider_platform_id: i64,
    request_id: RequestId,
    cancel: CancellationToken,
    phase: Option<SyncPhase>,
) -> Result<ProviderSync, ApiError> {
    let platform = load_enabled_platform(state, provider_platform_id).await?;

    let gateway = state
        .gateways
        .connect(&platform)
        .await
        .map_err(|e| ApiError::BadGateway {
            message: e.to_string(),
            phase: phase.map(|p| p.as_str().to_string()),
            provider_platform_id: Some(provider_platform_id),
        })?;

    let store: Arc<dyn SyncStore> = state.store.clone();
    Ok(ProviderSync::new(
        gateway,
        store,
        &state.config.import.default_email_domain,
        request_id.0,
        cancel,
    ))
}

async fn load_enabled_platform(
    state: &AppState,
    provider_platform_id: i64,
) -> Result<ProviderPlatform, ApiError> {
    let entity = ProviderPlatformRepository::new(state.pool.clone())
        .find_by_id(provider_platform_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Provider platform {} not found", provider_platform_id))
        })?;
    let platform = ProviderPlatform::try_from(entity)?;
    if !platform.is_enabled() {
        return Err(ApiError::Validation(format!(
            "Provider platform {} is {}",
            provider_platform_id,
            platform.state.as_str()
        )));
    }
    Ok(platform)
}
