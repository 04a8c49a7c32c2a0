//! Milestone entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the milestones table.
#[derive(Debug, Clone, FromRow)]
pub struct MilestoneEntity {
    pub id: i64,
    pub user_id: i64,
    pub program_id: i64,
    pub external_id: String,
    #[sqlx(rename = "type")]
    pub milestone_type: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Milestone row returned by an upsert.
#[derive(Debug, Clone, FromRow)]
pub struct UpsertedMilestoneEntity {
    #[sqlx(flatten)]
    pub milestone: MilestoneEntity,
    pub inserted: bool,
}

impl From<MilestoneEntity> for domain::models::Milestone {
    fn from(entity: MilestoneEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            program_id: entity.program_id,
            external_id: entity.external_id,
            milestone_type: entity.milestone_type,
            is_completed: entity.is_completed,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
