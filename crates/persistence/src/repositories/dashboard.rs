//! Dashboard read queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::{
    EnrolledProgramEntity, EnrollmentActivityEntity, RecentProgramCandidateEntity,
    WeeklyActivityEntity,
};
use crate::metrics::QueryTimer;

/// Repository for dashboard queries.
#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Programs with activity by the user and no outcome, with completed
    /// progress milestone counts.
    pub async fn recent_program_candidates(
        &self,
        user_id: i64,
    ) -> Result<Vec<RecentProgramCandidateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("dashboard_recent_programs");
        let result = sqlx::query_as::<_, RecentProgramCandidateEntity>(
            r#"
            SELECT p.id AS program_id, p.name, p.alt_name, p.thumbnail_url, p.external_url,
                   COALESCE(pp.name, '') AS provider_platform_name,
                   p.total_progress_milestones,
                   COUNT(m.id) AS completed_milestones,
                   MAX(m.updated_at) AS last_completed_at
            FROM programs p
            LEFT JOIN provider_platforms pp ON pp.id = p.provider_platform_id
            LEFT JOIN milestones m
                   ON m.program_id = p.id
                  AND m.user_id = $1
                  AND m.is_completed
                  AND m.type IN ('assignment_submission', 'quiz_submission')
            WHERE p.id IN (SELECT program_id FROM activities WHERE user_id = $1)
              AND NOT EXISTS (
                  SELECT 1 FROM outcomes o WHERE o.program_id = p.id AND o.user_id = $1
              )
            GROUP BY p.id, pp.name
            ORDER BY p.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn enrollment_activity(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<EnrollmentActivityEntity>, sqlx::Error> {
        let timer = QueryTimer::new("dashboard_enrollments");
        let result = sqlx::query_as::<_, EnrollmentActivityEntity>(
            r#"
            SELECT p.id AS program_id, p.name, p.alt_name, p.thumbnail_url, p.external_url,
                   pp.name AS provider_platform_name, a.time_delta
            FROM activities a
            JOIN programs p ON p.id = a.program_id
            JOIN provider_platforms pp ON pp.id = p.provider_platform_id
            WHERE a.user_id = $1
              AND a.created_at >= $2
              AND NOT EXISTS (
                  SELECT 1 FROM outcomes o WHERE o.program_id = p.id AND o.user_id = $1
              )
            ORDER BY a.created_at, a.id
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn milestone_programs(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<EnrolledProgramEntity>, sqlx::Error> {
        let timer = QueryTimer::new("dashboard_milestone_programs");
        let result = sqlx::query_as::<_, EnrolledProgramEntity>(
            r#"
            SELECT p.id AS program_id, p.name, p.alt_name, p.thumbnail_url, p.external_url,
                   pp.name AS provider_platform_name
            FROM programs p
            JOIN provider_platforms pp ON pp.id = p.provider_platform_id
            WHERE EXISTS (
                SELECT 1 FROM milestones m WHERE m.program_id = p.id AND m.user_id = $1
            )
            ORDER BY p.id
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn weekly_activity(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<WeeklyActivityEntity>, sqlx::Error> {
        let timer = QueryTimer::new("dashboard_weekly_activity");
        let result = sqlx::query_as::<_, WeeklyActivityEntity>(
            r#"
            SELECT (a.created_at AT TIME ZONE 'UTC')::date AS date,
                   SUM(a.time_delta)::BIGINT AS total_time
            FROM activities a
            WHERE a.user_id = $1 AND a.created_at >= $2
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
