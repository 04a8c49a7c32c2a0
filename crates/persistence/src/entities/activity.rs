//! Activity entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the activities table.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityEntity {
    pub id: i64,
    pub user_id: i64,
    pub program_id: i64,
    #[sqlx(rename = "type")]
    pub activity_type: String,
    pub total_time: i64,
    pub time_delta: i64,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityEntity> for domain::models::Activity {
    fn from(entity: ActivityEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            program_id: entity.program_id,
            activity_type: entity.activity_type,
            total_time: entity.total_time,
            time_delta: entity.time_delta,
            external_id: entity.external_id,
            created_at: entity.created_at,
        }
    }
}
