//! Persistence seams used by the import and analytics services.
//!
//! The Postgres implementation lives in the persistence crate; an in-memory
//! implementation is provided in [`super::memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    Activity, ActivityIngest, EnrolledProgram, EnrollmentActivityRow, ExternalIdentity,
    MappingUpdate, Milestone, NewMilestone, NewProgram, NewUser, Program, ProviderUserMapping,
    RecentProgramCandidate, Upserted, User, WeeklyActivity,
};

/// Errors raised by a data store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Identity, catalog and activity writes performed by a provider import.
#[async_trait]
pub trait SyncStore: Send + Sync {
    async fn find_mapping_by_external(
        &self,
        provider_platform_id: i64,
        external_user_id: &str,
    ) -> Result<Option<ProviderUserMapping>, StoreError>;

    /// Creates the user and its mapping atomically.
    async fn create_user_with_mapping(
        &self,
        user: NewUser,
        identity: ExternalIdentity,
    ) -> Result<(User, ProviderUserMapping), StoreError>;

    async fn mappings_for_provider(
        &self,
        provider_platform_id: i64,
    ) -> Result<Vec<ProviderUserMapping>, StoreError>;

    async fn mapping_for_user(
        &self,
        user_id: i64,
        provider_platform_id: i64,
    ) -> Result<Option<ProviderUserMapping>, StoreError>;

    /// Fails with `NotFound` when no mapping matches.
    async fn update_mapping(
        &self,
        user_id: i64,
        provider_platform_id: i64,
        update: &MappingUpdate,
    ) -> Result<ProviderUserMapping, StoreError>;

    async fn programs_for_provider(
        &self,
        provider_platform_id: i64,
    ) -> Result<Vec<Program>, StoreError>;

    /// Inserts or refreshes a program keyed by provider and external id.
    async fn upsert_program(&self, program: NewProgram) -> Result<Upserted<Program>, StoreError>;

    /// Inserts or refreshes a milestone keyed by program, user and external id.
    async fn upsert_milestone(
        &self,
        milestone: NewMilestone,
    ) -> Result<Upserted<Milestone>, StoreError>;

    /// Stores an activity row whose delta is computed against the last
    /// reported total for the same key, atomically with the baseline update.
    async fn ingest_activity(&self, ingest: ActivityIngest) -> Result<Activity, StoreError>;
}

/// Reads used by the daily activity view.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Activity rows for a user created within `[from, to]`, oldest first.
    async fn activities_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Activity>, StoreError>;
}

/// Reads used by the dashboard assembler.
#[async_trait]
pub trait DashboardStore: Send + Sync {
    /// Programs with any activity by the user and no outcome for the user.
    async fn recent_program_candidates(
        &self,
        user_id: i64,
    ) -> Result<Vec<RecentProgramCandidate>, StoreError>;

    /// Activity rows since `since` for programs without an outcome for the user.
    async fn enrollment_activity(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<EnrollmentActivityRow>, StoreError>;

    /// Distinct programs the user has any milestone in, at most `limit`.
    async fn milestone_programs(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<EnrolledProgram>, StoreError>;

    /// Total time delta per day since `since`, oldest day first.
    async fn weekly_activity(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<WeeklyActivity>, StoreError>;
}
