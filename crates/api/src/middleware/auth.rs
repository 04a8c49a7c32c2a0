//! Admin API key middleware.
//!
//! Action, registry and analytics routes are called by an administrative
//! client holding one of the configured keys.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app::AppState;

/// Header carrying the admin API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Rejects requests whose `X-API-Key` does not hash to a configured admin key.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let api_key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !shared::crypto::key_matches_any(api_key, &state.config.security.admin_api_key_hashes) {
        tracing::debug!(path = %req.uri().path(), "Rejected request without a valid admin key");
        return unauthorized_response("Invalid or missing API key");
    }

    next.run(req).await
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}
