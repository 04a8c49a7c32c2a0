//! HTTP route handlers.

pub mod actions;
pub mod activity;
pub mod dashboard;
pub mod health;
pub mod logins;
pub mod outcomes;
pub mod programs;
pub mod provider_platforms;

use crate::app::AppState;
use crate::error::ApiError;

/// 404 unless the user exists.
pub(crate) async fn ensure_user(state: &AppState, user_id: i64) -> Result<(), ApiError> {
    match state.store.find_user(user_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound(format!("User {} not found", user_id))),
    }
}
