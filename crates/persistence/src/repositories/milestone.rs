//! Milestone repository for database operations.

use domain::models::NewMilestone;
use sqlx::{PgPool, Postgres, Transaction};

use crate::entities::{MilestoneEntity, UpsertedMilestoneEntity};
use crate::metrics::QueryTimer;

const COLUMNS: &str =
    "id, user_id, program_id, external_id, type, is_completed, created_at, updated_at";

/// Repository for milestone database operations.
#[derive(Clone)]
pub struct MilestoneRepository {
    pool: PgPool,
}

impl MilestoneRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts a milestone or refreshes the row with the same program, user and external id.
    pub async fn upsert(
        &self,
        milestone: &NewMilestone,
    ) -> Result<UpsertedMilestoneEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_milestone");
        let query = format!(
            r#"
            INSERT INTO milestones (user_id, program_id, external_id, type, is_completed)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (program_id, user_id, external_id) DO UPDATE
            SET type = EXCLUDED.type,
                is_completed = EXCLUDED.is_completed,
                updated_at = NOW()
            RETURNING {}, (xmax = 0) AS inserted
            "#,
            COLUMNS
        );
        let result = sqlx::query_as::<_, UpsertedMilestoneEntity>(&query)
            .bind(milestone.user_id)
            .bind(milestone.program_id)
            .bind(&milestone.external_id)
            .bind(&milestone.milestone_type)
            .bind(milestone.is_completed)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn lock_by_id(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<MilestoneEntity>, sqlx::Error> {
        let query = format!("SELECT {} FROM milestones WHERE id = $1 FOR UPDATE", COLUMNS);
        sqlx::query_as::<_, MilestoneEntity>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn write(
        tx: &mut Transaction<'_, Postgres>,
        milestone: &domain::models::Milestone,
    ) -> Result<MilestoneEntity, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE milestones
            SET type = $2, is_completed = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        );
        sqlx::query_as::<_, MilestoneEntity>(&query)
            .bind(milestone.id)
            .bind(&milestone.milestone_type)
            .bind(milestone.is_completed)
            .fetch_one(&mut **tx)
            .await
    }
}
