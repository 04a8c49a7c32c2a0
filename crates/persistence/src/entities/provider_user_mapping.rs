//! Provider user mapping entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the provider_user_mappings table.
#[derive(Debug, Clone, FromRow)]
pub struct ProviderUserMappingEntity {
    pub id: i64,
    pub user_id: i64,
    pub provider_platform_id: i64,
    pub external_user_id: String,
    pub external_username: String,
    pub external_login_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<ProviderUserMappingEntity> for domain::models::ProviderUserMapping {
    fn from(entity: ProviderUserMappingEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            provider_platform_id: entity.provider_platform_id,
            external_user_id: entity.external_user_id,
            external_username: entity.external_username,
            external_login_id: entity.external_login_id,
            created_at: entity.created_at,
        }
    }
}
