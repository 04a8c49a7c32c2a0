//! Row mappings for the dashboard queries.

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::{
    EnrolledProgram, EnrollmentActivityRow, RecentProgramCandidate, WeeklyActivity,
};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct RecentProgramCandidateEntity {
    pub program_id: i64,
    pub name: String,
    pub alt_name: String,
    pub thumbnail_url: String,
    pub external_url: String,
    pub provider_platform_name: String,
    pub total_progress_milestones: i64,
    pub completed_milestones: i64,
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl From<RecentProgramCandidateEntity> for RecentProgramCandidate {
    fn from(e: RecentProgramCandidateEntity) -> Self {
        Self {
            program_id: e.program_id,
            name: e.name,
            alt_name: e.alt_name,
            thumbnail_url: e.thumbnail_url,
            external_url: e.external_url,
            provider_platform_name: e.provider_platform_name,
            total_progress_milestones: e.total_progress_milestones,
            completed_milestones: e.completed_milestones,
            last_completed_at: e.last_completed_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct EnrollmentActivityEntity {
    pub program_id: i64,
    pub name: String,
    pub alt_name: String,
    pub thumbnail_url: String,
    pub external_url: String,
    pub provider_platform_name: String,
    pub time_delta: i64,
}

impl From<EnrollmentActivityEntity> for EnrollmentActivityRow {
    fn from(e: EnrollmentActivityEntity) -> Self {
        Self {
            program_id: e.program_id,
            name: e.name,
            alt_name: e.alt_name,
            thumbnail_url: e.thumbnail_url,
            external_url: e.external_url,
            provider_platform_name: e.provider_platform_name,
            time_delta: e.time_delta,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct EnrolledProgramEntity {
    pub program_id: i64,
    pub name: String,
    pub alt_name: String,
    pub thumbnail_url: String,
    pub external_url: String,
    pub provider_platform_name: String,
}

impl From<EnrolledProgramEntity> for EnrolledProgram {
    fn from(e: EnrolledProgramEntity) -> Self {
        Self {
            program_id: e.program_id,
            name: e.name,
            alt_name: e.alt_name,
            thumbnail_url: e.thumbnail_url,
            external_url: e.external_url,
            provider_platform_name: e.provider_platform_name,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct WeeklyActivityEntity {
    pub date: NaiveDate,
    pub total_time: i64,
}

impl From<WeeklyActivityEntity> for WeeklyActivity {
    fn from(e: WeeklyActivityEntity) -> Self {
        Self {
            date: e.date,
            total_time: e.total_time,
        }
    }
}
