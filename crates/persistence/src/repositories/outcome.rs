//! Outcome repository for database operations.

use domain::models::{CreateOutcomeRequest, Outcome, OutcomeType};
use sqlx::{PgPool, Postgres, Transaction};

use crate::entities::OutcomeEntity;
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, user_id, program_id, type, value, created_at";

/// Repository for a user's program outcomes.
#[derive(Clone)]
pub struct OutcomeRepository {
    pool: PgPool,
}

impl OutcomeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create(
        &self,
        user_id: i64,
        request: &CreateOutcomeRequest,
    ) -> Result<OutcomeEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_outcome");
        let query = format!(
            r#"
            INSERT INTO outcomes (user_id, program_id, type, value)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            COLUMNS
        );
        let result = sqlx::query_as::<_, OutcomeEntity>(&query)
            .bind(user_id)
            .bind(request.program_id)
            .bind(request.outcome_type.as_str())
            .bind(request.value.trim())
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Lists a user's outcomes, newest first, with the total count.
    pub async fn list_for_user(
        &self,
        user_id: i64,
        outcome_type: Option<OutcomeType>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OutcomeEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_outcomes_for_user");
        let outcome_type = outcome_type.map(|t| t.as_str());
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM outcomes WHERE user_id = $1 AND ($2::text IS NULL OR type = $2)",
        )
        .bind(user_id)
        .bind(outcome_type)
        .fetch_one(&self.pool)
        .await?;
        let query = format!(
            r#"
            SELECT {} FROM outcomes
            WHERE user_id = $1 AND ($2::text IS NULL OR type = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
            COLUMNS
        );
        let rows = sqlx::query_as::<_, OutcomeEntity>(&query)
            .bind(user_id)
            .bind(outcome_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        timer.record();
        Ok((rows, total))
    }

    pub async fn lock_for_user(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        id: i64,
    ) -> Result<Option<OutcomeEntity>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM outcomes WHERE id = $1 AND user_id = $2 FOR UPDATE",
            COLUMNS
        );
        sqlx::query_as::<_, OutcomeEntity>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn write(
        tx: &mut Transaction<'_, Postgres>,
        outcome: &Outcome,
    ) -> Result<OutcomeEntity, sqlx::Error> {
        let query = format!(
            "UPDATE outcomes SET type = $2, value = $3 WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        sqlx::query_as::<_, OutcomeEntity>(&query)
            .bind(outcome.id)
            .bind(outcome.outcome_type.as_str())
            .bind(&outcome.value)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_outcome");
        let result = sqlx::query("DELETE FROM outcomes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
