use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::{GatewayError, ReconciliationError, StoreError, SyncError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {message}")]
    InvalidFields {
        message: String,
        details: Vec<ValidationDetail>,
    },

    #[error("Bad gateway: {message}")]
    BadGateway {
        message: String,
        phase: Option<String>,
        provider_platform_id: Option<i64>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_platform_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut phase = None;
        let mut provider_platform_id = None;
        let mut details = None;
        let (status, error_code, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::InvalidFields {
                message,
                details: fields,
            } => {
                details = Some(fields);
                (StatusCode::BAD_REQUEST, "validation_error", message)
            }
            ApiError::BadGateway {
                message,
                phase: p,
                provider_platform_id: id,
            } => {
                tracing::warn!(phase = ?p, provider_platform_id = ?id, "Provider gateway error: {}", message);
                phase = p;
                provider_platform_id = id;
                (StatusCode::BAD_GATEWAY, "bad_gateway", message)
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details,
            phase,
            provider_platform_id,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        persistence::error::store_error(err).into()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Invalid(msg) => ApiError::Validation(msg),
            StoreError::Database(msg) => ApiError::Internal(format!("Database error: {}", msg)),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::BadGateway {
            message: err.to_string(),
            phase: None,
            provider_platform_id: None,
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Gateway {
                phase,
                provider_platform_id,
                source,
            } => ApiError::BadGateway {
                message: source.to_string(),
                phase: Some(phase.as_str().to_string()),
                provider_platform_id: Some(provider_platform_id),
            },
            SyncError::Store { source, .. } => source.into(),
            SyncError::Busy(_) => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<ReconciliationError> for ApiError {
    fn from(err: ReconciliationError) -> Self {
        match err {
            ReconciliationError::MappingNotFound { .. } => ApiError::NotFound(err.to_string()),
            ReconciliationError::Store(source) => source.into(),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::InvalidFields { message, details }
    }
}
