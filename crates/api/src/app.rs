use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use persistence::PgSyncStore;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, require_admin, trace_id};
use crate::routes::{
    actions, activity, dashboard, health, logins, outcomes, programs, provider_platforms,
};
use crate::services::{GatewayFactory, HttpGatewayFactory, ProviderLocks};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub store: Arc<PgSyncStore>,
    pub gateways: Arc<dyn GatewayFactory>,
    pub provider_locks: Arc<ProviderLocks>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let gateways = Arc::new(HttpGatewayFactory::new(config.provider_service.clone()));
    create_app_with_gateways(config, pool, gateways)
}

/// Builds the router with a caller-supplied gateway factory.
pub fn create_app_with_gateways(
    config: Config,
    pool: PgPool,
    gateways: Arc<dyn GatewayFactory>,
) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        store: Arc::new(PgSyncStore::new(pool.clone())),
        pool,
        config: config.clone(),
        gateways,
        provider_locks: Arc::new(ProviderLocks::new()),
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Import triggers
    let action_routes = Router::new()
        .route(
            "/api/v1/actions/provider-platforms/:id/import-users",
            post(actions::import_users),
        )
        .route(
            "/api/v1/actions/provider-platforms/:id/import-programs",
            post(actions::import_programs),
        )
        .route(
            "/api/v1/actions/provider-platforms/:id/import-milestones",
            post(actions::import_milestones),
        )
        .route(
            "/api/v1/actions/provider-platforms/:id/import-activity",
            post(actions::import_activity),
        )
        .route(
            "/api/v1/actions/provider-platforms/:id/sync",
            post(actions::sync_provider),
        );

    let admin_routes = Router::new()
        .route(
            "/api/v1/provider-platforms",
            get(provider_platforms::list_provider_platforms)
                .post(provider_platforms::create_provider_platform),
        )
        .route(
            "/api/v1/provider-platforms/:id",
            get(provider_platforms::get_provider_platform)
                .patch(provider_platforms::patch_provider_platform)
                .delete(provider_platforms::delete_provider_platform),
        )
        .route(
            "/api/v1/users/:user_id/logins",
            get(logins::list_logins).post(logins::create_login),
        )
        .route(
            "/api/v1/users/:user_id/logins/:provider_platform_id",
            put(logins::update_login).delete(logins::delete_login),
        )
        .route(
            "/api/v1/users/:user_id/dashboard",
            get(dashboard::get_user_dashboard),
        )
        .route(
            "/api/v1/users/:user_id/daily-activity",
            get(activity::get_daily_activity),
        )
        .route(
            "/api/v1/users/:user_id/activity",
            get(activity::list_user_activity).post(activity::create_user_activity),
        )
        .route(
            "/api/v1/programs/:id/activity",
            get(activity::list_program_activity),
        )
        .route(
            "/api/v1/users/:user_id/outcomes",
            get(outcomes::list_outcomes).post(outcomes::create_outcome),
        )
        .route(
            "/api/v1/users/:user_id/outcomes/:outcome_id",
            patch(outcomes::patch_outcome).delete(outcomes::delete_outcome),
        )
        .route("/api/v1/programs/:id", patch(programs::patch_program))
        .route("/api/v1/milestones/:id", patch(programs::patch_milestone))
        // Import routes below are not bounded by the request timeout
        .route_layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .merge(action_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
