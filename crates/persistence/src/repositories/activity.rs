//! Activity repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::ActivityIngest;
use domain::services::compute_delta;
use sqlx::PgPool;

use crate::entities::ActivityEntity;
use crate::metrics::QueryTimer;

const COLUMNS: &str =
    "id, user_id, program_id, type, total_time, time_delta, external_id, created_at";

/// Repository for activity database operations.
#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts an activity row with its delta against the last reported total.
    ///
    /// The per-key baseline row is locked for the whole transaction, so
    /// concurrent ingestion for the same key is serialized.
    pub async fn ingest(&self, ingest: &ActivityIngest) -> Result<ActivityEntity, sqlx::Error> {
        let timer = QueryTimer::new("ingest_activity");
        let key_external_id = ingest.external_id.clone().unwrap_or_default();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO activity_totals (user_id, program_id, external_id, last_total)
            VALUES ($1, $2, $3, NULL)
            ON CONFLICT (user_id, program_id, external_id) DO NOTHING
            "#,
        )
        .bind(ingest.user_id)
        .bind(ingest.program_id)
        .bind(&key_external_id)
        .execute(&mut *tx)
        .await?;

        let last_total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT last_total FROM activity_totals
            WHERE user_id = $1 AND program_id = $2 AND external_id = $3
            FOR UPDATE
            "#,
        )
        .bind(ingest.user_id)
        .bind(ingest.program_id)
        .bind(&key_external_id)
        .fetch_one(&mut *tx)
        .await?;

        let time_delta = compute_delta(last_total, ingest.total_time);

        let query = format!(
            r#"
            INSERT INTO activities (user_id, program_id, type, total_time, time_delta, external_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            COLUMNS
        );
        let activity = sqlx::query_as::<_, ActivityEntity>(&query)
            .bind(ingest.user_id)
            .bind(ingest.program_id)
            .bind(&ingest.activity_type)
            .bind(ingest.total_time)
            .bind(time_delta)
            .bind(&ingest.external_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE activity_totals
            SET last_total = $4, updated_at = NOW()
            WHERE user_id = $1 AND program_id = $2 AND external_id = $3
            "#,
        )
        .bind(ingest.user_id)
        .bind(ingest.program_id)
        .bind(&key_external_id)
        .bind(ingest.total_time)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(activity)
    }

    /// Activity rows of a user within `[from, to]`, oldest first.
    pub async fn list_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ActivityEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_activity_between");
        let query = format!(
            r#"
            SELECT {} FROM activities
            WHERE user_id = $1 AND created_at BETWEEN $2 AND $3
            ORDER BY created_at, id
            "#,
            COLUMNS
        );
        let result = sqlx::query_as::<_, ActivityEntity>(&query)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// A page of a user's activity, newest first, with the total count.
    pub async fn list_for_user(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ActivityEntity>, i64), sqlx::Error> {
        self.list_page("user_id", user_id, limit, offset).await
    }

    /// A page of a program's activity, newest first, with the total count.
    pub async fn list_for_program(
        &self,
        program_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ActivityEntity>, i64), sqlx::Error> {
        self.list_page("program_id", program_id, limit, offset).await
    }

    async fn list_page(
        &self,
        column: &'static str,
        id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ActivityEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new(format!("list_activity_by_{}", column));
        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM activities WHERE {} = $1", column))
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        let query = format!(
            "SELECT {} FROM activities WHERE {} = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            COLUMNS, column
        );
        let rows = sqlx::query_as::<_, ActivityEntity>(&query)
            .bind(id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        timer.record();
        Ok((rows, total))
    }
}
