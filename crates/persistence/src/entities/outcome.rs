//! Outcome entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::Outcome;
use domain::services::StoreError;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct OutcomeEntity {
    pub id: i64,
    pub user_id: i64,
    pub program_id: i64,
    #[sqlx(rename = "type")]
    pub outcome_type: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<OutcomeEntity> for Outcome {
    type Error = StoreError;

    fn try_from(entity: OutcomeEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            user_id: entity.user_id,
            program_id: entity.program_id,
            outcome_type: entity.outcome_type.parse().map_err(StoreError::Invalid)?,
            value: entity.value,
            created_at: entity.created_at,
        })
    }
}
