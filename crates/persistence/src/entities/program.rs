//! Program entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::Program;
use domain::services::StoreError;
use sqlx::FromRow;

/// Database row mapping for the programs table.
#[derive(Debug, Clone, FromRow)]
pub struct ProgramEntity {
    pub id: i64,
    pub provider_platform_id: i64,
    pub name: String,
    pub alt_name: String,
    pub description: String,
    pub external_id: String,
    pub thumbnail_url: String,
    pub external_url: String,
    #[sqlx(rename = "type")]
    pub program_type: String,
    pub outcome_types: String,
    pub total_progress_milestones: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Program row returned by an upsert, flagged when the row was inserted.
#[derive(Debug, Clone, FromRow)]
pub struct UpsertedProgramEntity {
    #[sqlx(flatten)]
    pub program: ProgramEntity,
    pub inserted: bool,
}

impl TryFrom<ProgramEntity> for Program {
    type Error = StoreError;

    fn try_from(entity: ProgramEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            provider_platform_id: entity.provider_platform_id,
            name: entity.name,
            alt_name: entity.alt_name,
            description: entity.description,
            external_id: entity.external_id,
            thumbnail_url: entity.thumbnail_url,
            external_url: entity.external_url,
            program_type: entity.program_type.parse().map_err(StoreError::Invalid)?,
            outcome_types: entity.outcome_types,
            total_progress_milestones: entity.total_progress_milestones,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}
