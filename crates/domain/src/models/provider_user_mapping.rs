//! Identity mapping between provider accounts and internal users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Durable association between an external user and an internal user.
///
/// Unique on `(provider_platform_id, external_user_id)` and on
/// `(user_id, provider_platform_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderUserMapping {
    pub id: i64,
    pub user_id: i64,
    pub provider_platform_id: i64,
    pub external_user_id: String,
    pub external_username: String,
    pub external_login_id: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a mapping row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProviderUserMapping {
    pub user_id: i64,
    pub provider_platform_id: i64,
    pub external_user_id: String,
    pub external_username: String,
    pub external_login_id: String,
}

/// Provider-side identifiers of a user, before an internal user is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub provider_platform_id: i64,
    pub external_user_id: String,
    pub external_username: String,
    pub external_login_id: String,
}

impl ExternalIdentity {
    pub fn for_user(self, user_id: i64) -> NewProviderUserMapping {
        NewProviderUserMapping {
            user_id,
            provider_platform_id: self.provider_platform_id,
            external_user_id: self.external_user_id,
            external_username: self.external_username,
            external_login_id: self.external_login_id,
        }
    }
}

/// Request body for linking a user to a provider account by hand.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMappingRequest {
    pub provider_platform_id: i64,

    #[validate(length(min = 1, max = 255, message = "external_user_id must be 1-255 characters"))]
    pub external_user_id: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "external_username must be at most 255 characters"))]
    pub external_username: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "external_login_id must be at most 255 characters"))]
    pub external_login_id: String,
}

impl CreateMappingRequest {
    pub fn into_new_mapping(self, user_id: i64) -> NewProviderUserMapping {
        NewProviderUserMapping {
            user_id,
            provider_platform_id: self.provider_platform_id,
            external_user_id: self.external_user_id,
            external_username: self.external_username,
            external_login_id: self.external_login_id,
        }
    }
}

/// Explicit update of an existing mapping. Unset fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingUpdate {
    pub external_user_id: Option<String>,
    pub external_username: Option<String>,
    pub external_login_id: Option<String>,
}

impl MappingUpdate {
    pub fn is_empty(&self) -> bool {
        self.external_user_id.is_none()
            && self.external_username.is_none()
            && self.external_login_id.is_none()
    }

    pub fn apply(&self, mapping: &mut ProviderUserMapping) {
        if let Some(v) = &self.external_user_id {
            mapping.external_user_id = v.clone();
        }
        if let Some(v) = &self.external_username {
            mapping.external_username = v.clone();
        }
        if let Some(v) = &self.external_login_id {
            mapping.external_login_id = v.clone();
        }
    }
}
