//! Provider platform entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::ProviderPlatform;
use domain::services::StoreError;
use sqlx::FromRow;

/// Database row mapping for the provider_platforms table.
#[derive(Debug, Clone, FromRow)]
pub struct ProviderPlatformEntity {
    pub id: i64,
    pub name: String,
    #[sqlx(rename = "type")]
    pub platform_type: String,
    pub description: Option<String>,
    pub base_url: String,
    pub account_id: String,
    pub access_key: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProviderPlatformEntity> for ProviderPlatform {
    type Error = StoreError;

    fn try_from(entity: ProviderPlatformEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            name: entity.name,
            platform_type: entity.platform_type.parse().map_err(StoreError::Invalid)?,
            description: entity.description,
            base_url: entity.base_url,
            account_id: entity.account_id,
            access_key: entity.access_key,
            state: entity.state.parse().map_err(StoreError::Invalid)?,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}
