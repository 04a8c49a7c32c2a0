//! Postgres implementation of the domain store seams.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{
    Activity, ActivityIngest, EnrolledProgram, EnrollmentActivityRow, ExternalIdentity,
    MappingUpdate, Milestone, MilestonePatch, NewMilestone, NewProgram, NewUser, Outcome,
    OutcomePatch, Program, ProgramPatch, ProviderPlatform, ProviderPlatformPatch,
    ProviderUserMapping, RecentProgramCandidate, Upserted, User, WeeklyActivity,
};
use domain::services::{
    validate_ingest, ActivityStore, DashboardStore, StoreError, SyncStore,
};
use sqlx::PgPool;

use crate::error::store_error;
use crate::metrics::QueryTimer;
use crate::repositories::{
    ActivityRepository, DashboardRepository, MilestoneRepository, OutcomeRepository,
    ProgramRepository, ProviderPlatformRepository, ProviderUserMappingRepository, UserRepository,
};

/// Store backed by the Postgres pool.
#[derive(Clone)]
pub struct PgSyncStore {
    users: UserRepository,
    mappings: ProviderUserMappingRepository,
    programs: ProgramRepository,
    milestones: MilestoneRepository,
    outcomes: OutcomeRepository,
    platforms: ProviderPlatformRepository,
    activities: ActivityRepository,
    dashboard: DashboardRepository,
}

impl PgSyncStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            mappings: ProviderUserMappingRepository::new(pool.clone()),
            programs: ProgramRepository::new(pool.clone()),
            milestones: MilestoneRepository::new(pool.clone()),
            outcomes: OutcomeRepository::new(pool.clone()),
            platforms: ProviderPlatformRepository::new(pool.clone()),
            activities: ActivityRepository::new(pool.clone()),
            dashboard: DashboardRepository::new(pool),
        }
    }

    /// Applies a partial update to a program under a row lock.
    pub async fn patch_program(&self, id: i64, patch: &ProgramPatch) -> Result<Program, StoreError> {
        let timer = QueryTimer::new("patch_program");
        let mut tx = self.programs.pool().begin().await.map_err(store_error)?;
        let entity = ProgramRepository::lock_by_id(&mut tx, id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::NotFound("Program".to_string()))?;
        let mut program = Program::try_from(entity)?;
        patch.apply(&mut program);
        let written = ProgramRepository::write(&mut tx, &program)
            .await
            .map_err(store_error)?;
        tx.commit().await.map_err(store_error)?;
        timer.record();
        Program::try_from(written)
    }

    /// Applies a partial update to a milestone under a row lock.
    pub async fn patch_milestone(
        &self,
        id: i64,
        patch: &MilestonePatch,
    ) -> Result<Milestone, StoreError> {
        let timer = QueryTimer::new("patch_milestone");
        let mut tx = self.milestones.pool().begin().await.map_err(store_error)?;
        let entity = MilestoneRepository::lock_by_id(&mut tx, id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::NotFound("Milestone".to_string()))?;
        let mut milestone = Milestone::from(entity);
        patch.apply(&mut milestone);
        let written = MilestoneRepository::write(&mut tx, &milestone)
            .await
            .map_err(store_error)?;
        tx.commit().await.map_err(store_error)?;
        timer.record();
        Ok(written.into())
    }

    /// Applies a partial update to one of a user's outcomes under a row lock.
    pub async fn patch_outcome(
        &self,
        user_id: i64,
        id: i64,
        patch: &OutcomePatch,
    ) -> Result<Outcome, StoreError> {
        let timer = QueryTimer::new("patch_outcome");
        let mut tx = self.outcomes.pool().begin().await.map_err(store_error)?;
        let entity = OutcomeRepository::lock_for_user(&mut tx, user_id, id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::NotFound("Outcome".to_string()))?;
        let mut outcome = Outcome::try_from(entity)?;
        patch.apply(&mut outcome);
        let written = OutcomeRepository::write(&mut tx, &outcome)
            .await
            .map_err(store_error)?;
        tx.commit().await.map_err(store_error)?;
        timer.record();
        Outcome::try_from(written)
    }

    /// Applies a platform patch under a row lock.
    pub async fn patch_provider_platform(
        &self,
        id: i64,
        patch: &ProviderPlatformPatch,
    ) -> Result<ProviderPlatform, StoreError> {
        let timer = QueryTimer::new("patch_provider_platform");
        let mut tx = self.platforms.pool().begin().await.map_err(store_error)?;
        let entity = ProviderPlatformRepository::lock_by_id(&mut tx, id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| StoreError::NotFound("Provider platform".to_string()))?;
        let mut platform = ProviderPlatform::try_from(entity)?;
        patch.apply(&mut platform).map_err(StoreError::Invalid)?;
        let written = ProviderPlatformRepository::write(&mut tx, &platform)
            .await
            .map_err(store_error)?;
        tx.commit().await.map_err(store_error)?;
        timer.record();
        ProviderPlatform::try_from(written)
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .find_by_id(id)
            .await
            .map_err(store_error)?
            .map(User::from))
    }

    pub async fn find_program(&self, id: i64) -> Result<Option<Program>, StoreError> {
        self.programs
            .find_by_id(id)
            .await
            .map_err(store_error)?
            .map(Program::try_from)
            .transpose()
    }
}

#[async_trait]
impl SyncStore for PgSyncStore {
    async fn find_mapping_by_external(
        &self,
        provider_platform_id: i64,
        external_user_id: &str,
    ) -> Result<Option<ProviderUserMapping>, StoreError> {
        Ok(self
            .mappings
            .find_by_external(provider_platform_id, external_user_id)
            .await
            .map_err(store_error)?
            .map(Into::into))
    }

    async fn create_user_with_mapping(
        &self,
        user: NewUser,
        identity: ExternalIdentity,
    ) -> Result<(User, ProviderUserMapping), StoreError> {
        let (user, mapping) = self
            .users
            .create_with_mapping(&user, &identity)
            .await
            .map_err(store_error)?;
        Ok((user.into(), mapping.into()))
    }

    async fn mappings_for_provider(
        &self,
        provider_platform_id: i64,
    ) -> Result<Vec<ProviderUserMapping>, StoreError> {
        Ok(self
            .mappings
            .list_for_provider(provider_platform_id)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn mapping_for_user(
        &self,
        user_id: i64,
        provider_platform_id: i64,
    ) -> Result<Option<ProviderUserMapping>, StoreError> {
        Ok(self
            .mappings
            .find_for_user(user_id, provider_platform_id)
            .await
            .map_err(store_error)?
            .map(Into::into))
    }

    async fn update_mapping(
        &self,
        user_id: i64,
        provider_platform_id: i64,
        update: &MappingUpdate,
    ) -> Result<ProviderUserMapping, StoreError> {
        self.mappings
            .update(user_id, provider_platform_id, update)
            .await
            .map_err(store_error)?
            .map(Into::into)
            .ok_or_else(|| StoreError::NotFound("Provider user mapping".to_string()))
    }

    async fn programs_for_provider(
        &self,
        provider_platform_id: i64,
    ) -> Result<Vec<Program>, StoreError> {
        self.programs
            .list_for_provider(provider_platform_id)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Program::try_from)
            .collect()
    }

    async fn upsert_program(&self, program: NewProgram) -> Result<Upserted<Program>, StoreError> {
        let row = self.programs.upsert(&program).await.map_err(store_error)?;
        Ok(Upserted {
            entity: Program::try_from(row.program)?,
            created: row.inserted,
        })
    }

    async fn upsert_milestone(
        &self,
        milestone: NewMilestone,
    ) -> Result<Upserted<Milestone>, StoreError> {
        let row = self
            .milestones
            .upsert(&milestone)
            .await
            .map_err(store_error)?;
        Ok(Upserted {
            entity: row.milestone.into(),
            created: row.inserted,
        })
    }

    async fn ingest_activity(&self, ingest: ActivityIngest) -> Result<Activity, StoreError> {
        validate_ingest(&ingest)?;
        let activity: Activity = self
            .activities
            .ingest(&ingest)
            .await
            .map_err(store_error)?
            .into();
        crate::metrics::record_ingested_time(&activity.activity_type, activity.time_delta);
        tracing::debug!(
            user_id = activity.user_id,
            program_id = activity.program_id,
            delta = activity.time_delta,
            "Activity ingested"
        );
        Ok(activity)
    }
}

#[async_trait]
impl ActivityStore for PgSyncStore {
    async fn activities_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Activity>, StoreError> {
        Ok(self
            .activities
            .list_between(user_id, from, to)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}

#[async_trait]
impl DashboardStore for PgSyncStore {
    async fn recent_program_candidates(
        &self,
        user_id: i64,
    ) -> Result<Vec<RecentProgramCandidate>, StoreError> {
        Ok(self
            .dashboard
            .recent_program_candidates(user_id)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn enrollment_activity(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<EnrollmentActivityRow>, StoreError> {
        Ok(self
            .dashboard
            .enrollment_activity(user_id, since)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn milestone_programs(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<EnrolledProgram>, StoreError> {
        Ok(self
            .dashboard
            .milestone_programs(user_id, limit as i64)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn weekly_activity(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<WeeklyActivity>, StoreError> {
        Ok(self
            .dashboard
            .weekly_activity(user_id, since)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}
