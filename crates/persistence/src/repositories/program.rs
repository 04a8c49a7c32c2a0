//! Program repository for database operations.

use domain::models::NewProgram;
use sqlx::{PgPool, Postgres, Transaction};

use crate::entities::{ProgramEntity, UpsertedProgramEntity};
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, provider_platform_id, name, alt_name, description, external_id, thumbnail_url, external_url, type, outcome_types, total_progress_milestones, created_at, updated_at";

/// Repository for program database operations.
#[derive(Clone)]
pub struct ProgramRepository {
    pool: PgPool,
}

impl ProgramRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ProgramEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_program_by_id");
        let query = format!("SELECT {} FROM programs WHERE id = $1", COLUMNS);
        let result = sqlx::query_as::<_, ProgramEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn list_for_provider(
        &self,
        provider_platform_id: i64,
    ) -> Result<Vec<ProgramEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_programs_for_provider");
        let query = format!(
            "SELECT {} FROM programs WHERE provider_platform_id = $1 ORDER BY id",
            COLUMNS
        );
        let result = sqlx::query_as::<_, ProgramEntity>(&query)
            .bind(provider_platform_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Inserts a program or refreshes the row with the same provider and external id.
    pub async fn upsert(&self, program: &NewProgram) -> Result<UpsertedProgramEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_program");
        let query = format!(
            r#"
            INSERT INTO programs
                (provider_platform_id, name, alt_name, description, external_id, thumbnail_url,
                 external_url, type, outcome_types, total_progress_milestones)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (provider_platform_id, external_id) DO UPDATE
            SET name = EXCLUDED.name,
                alt_name = EXCLUDED.alt_name,
                description = EXCLUDED.description,
                thumbnail_url = EXCLUDED.thumbnail_url,
                external_url = EXCLUDED.external_url,
                type = EXCLUDED.type,
                outcome_types = EXCLUDED.outcome_types,
                total_progress_milestones = EXCLUDED.total_progress_milestones,
                updated_at = NOW()
            RETURNING {}, (xmax = 0) AS inserted
            "#,
            COLUMNS
        );
        let result = sqlx::query_as::<_, UpsertedProgramEntity>(&query)
            .bind(program.provider_platform_id)
            .bind(&program.name)
            .bind(&program.alt_name)
            .bind(&program.description)
            .bind(&program.external_id)
            .bind(&program.thumbnail_url)
            .bind(&program.external_url)
            .bind(program.program_type.as_str())
            .bind(&program.outcome_types)
            .bind(program.total_progress_milestones)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Locks a program row for a read-modify-write inside `tx`.
    pub async fn lock_by_id(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<ProgramEntity>, sqlx::Error> {
        let query = format!("SELECT {} FROM programs WHERE id = $1 FOR UPDATE", COLUMNS);
        sqlx::query_as::<_, ProgramEntity>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Writes every mutable column of a program inside `tx`.
    pub async fn write(
        tx: &mut Transaction<'_, Postgres>,
        program: &domain::models::Program,
    ) -> Result<ProgramEntity, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE programs
            SET name = $2, alt_name = $3, description = $4, thumbnail_url = $5,
                external_url = $6, type = $7, outcome_types = $8,
                total_progress_milestones = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        );
        sqlx::query_as::<_, ProgramEntity>(&query)
            .bind(program.id)
            .bind(&program.name)
            .bind(&program.alt_name)
            .bind(&program.description)
            .bind(&program.thumbnail_url)
            .bind(&program.external_url)
            .bind(program.program_type.as_str())
            .bind(&program.outcome_types)
            .bind(program.total_progress_milestones)
            .fetch_one(&mut **tx)
            .await
    }
}
