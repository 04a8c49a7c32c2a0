//! In-memory implementation of the store seams.
//!
//! Backs the service tests; other crates get it through the `test-util`
//! feature. All state sits behind one async mutex, so every operation is
//! serialized.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::models::milestone::is_progress_milestone;
use crate::models::{
    Activity, ActivityIngest, EnrolledProgram, EnrollmentActivityRow, ExternalIdentity,
    MappingUpdate, Milestone, NewMilestone, NewProgram, NewUser, Outcome, OutcomeType, Program,
    ProviderUserMapping, RecentProgramCandidate, Upserted, User, WeeklyActivity,
};

use super::activity_delta::{compute_delta, validate_ingest, ActivityKey};
use super::store::{ActivityStore, DashboardStore, StoreError, SyncStore};

#[derive(Default)]
struct State {
    next_id: i64,
    now: Option<DateTime<Utc>>,
    rejected_external_ids: HashSet<String>,
    provider_names: HashMap<i64, String>,
    users: Vec<User>,
    mappings: Vec<ProviderUserMapping>,
    programs: Vec<Program>,
    milestones: Vec<Milestone>,
    outcomes: Vec<Outcome>,
    activities: Vec<Activity>,
    totals: HashMap<ActivityKey, i64>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn check_rejected(&self, external_id: &str) -> Result<(), StoreError> {
        if self.rejected_external_ids.contains(external_id) {
            return Err(StoreError::Invalid(format!("record {} rejected", external_id)));
        }
        Ok(())
    }

    fn program(&self, id: i64) -> Option<&Program> {
        self.programs.iter().find(|p| p.id == id)
    }

    fn has_outcome(&self, user_id: i64, program_id: i64) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.user_id == user_id && o.program_id == program_id)
    }

    fn provider_name(&self, provider_platform_id: i64) -> String {
        self.provider_names
            .get(&provider_platform_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the clock used for `created_at` of new rows.
    pub async fn set_now(&self, now: DateTime<Utc>) {
        self.state.lock().await.now = Some(now);
    }

    /// Makes every write of a record with this external id fail.
    pub async fn reject_external_id(&self, external_id: impl Into<String>) {
        self.state
            .lock()
            .await
            .rejected_external_ids
            .insert(external_id.into());
    }

    pub async fn set_provider_name(&self, provider_platform_id: i64, name: impl Into<String>) {
        self.state
            .lock()
            .await
            .provider_names
            .insert(provider_platform_id, name.into());
    }

    pub async fn add_outcome(
        &self,
        user_id: i64,
        program_id: i64,
        outcome_type: OutcomeType,
    ) -> Outcome {
        let mut state = self.state.lock().await;
        let outcome = Outcome {
            id: state.next_id(),
            user_id,
            program_id,
            outcome_type,
            value: String::new(),
            created_at: state.now(),
        };
        state.outcomes.push(outcome.clone());
        outcome
    }

    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    pub async fn programs(&self) -> Vec<Program> {
        self.state.lock().await.programs.clone()
    }

    pub async fn milestones(&self) -> Vec<Milestone> {
        self.state.lock().await.milestones.clone()
    }

    pub async fn activities(&self) -> Vec<Activity> {
        self.state.lock().await.activities.clone()
    }
}

#[async_trait]
impl SyncStore for InMemoryStore {
    async fn find_mapping_by_external(
        &self,
        provider_platform_id: i64,
        external_user_id: &str,
    ) -> Result<Option<ProviderUserMapping>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .mappings
            .iter()
            .find(|m| {
                m.provider_platform_id == provider_platform_id
                    && m.external_user_id == external_user_id
            })
            .cloned())
    }

    async fn create_user_with_mapping(
        &self,
        user: NewUser,
        identity: ExternalIdentity,
    ) -> Result<(User, ProviderUserMapping), StoreError> {
        let mut state = self.state.lock().await;
        state.check_rejected(&identity.external_user_id)?;
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username {} already exists",
                user.username
            )));
        }
        if state.mappings.iter().any(|m| {
            m.provider_platform_id == identity.provider_platform_id
                && m.external_user_id == identity.external_user_id
        }) {
            return Err(StoreError::Conflict(format!(
                "external user {} already mapped",
                identity.external_user_id
            )));
        }

        let now = state.now();
        let user = User {
            id: state.next_id(),
            username: user.username,
            email: user.email,
            name_first: user.name_first,
            name_last: user.name_last,
            created_at: now,
            updated_at: now,
        };
        let new_mapping = identity.for_user(user.id);
        let mapping = ProviderUserMapping {
            id: state.next_id(),
            user_id: new_mapping.user_id,
            provider_platform_id: new_mapping.provider_platform_id,
            external_user_id: new_mapping.external_user_id,
            external_username: new_mapping.external_username,
            external_login_id: new_mapping.external_login_id,
            created_at: now,
        };
        state.users.push(user.clone());
        state.mappings.push(mapping.clone());
        Ok((user, mapping))
    }

    async fn mappings_for_provider(
        &self,
        provider_platform_id: i64,
    ) -> Result<Vec<ProviderUserMapping>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .mappings
            .iter()
            .filter(|m| m.provider_platform_id == provider_platform_id)
            .cloned()
            .collect())
    }

    async fn mapping_for_user(
        &self,
        user_id: i64,
        provider_platform_id: i64,
    ) -> Result<Option<ProviderUserMapping>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .mappings
            .iter()
            .find(|m| m.user_id == user_id && m.provider_platform_id == provider_platform_id)
            .cloned())
    }

    async fn update_mapping(
        &self,
        user_id: i64,
        provider_platform_id: i64,
        update: &MappingUpdate,
    ) -> Result<ProviderUserMapping, StoreError> {
        let mut state = self.state.lock().await;
        let mapping = state
            .mappings
            .iter_mut()
            .find(|m| m.user_id == user_id && m.provider_platform_id == provider_platform_id)
            .ok_or_else(|| StoreError::NotFound("Provider user mapping".to_string()))?;
        update.apply(mapping);
        Ok(mapping.clone())
    }

    async fn programs_for_provider(
        &self,
        provider_platform_id: i64,
    ) -> Result<Vec<Program>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .programs
            .iter()
            .filter(|p| p.provider_platform_id == provider_platform_id)
            .cloned()
            .collect())
    }

    async fn upsert_program(&self, program: NewProgram) -> Result<Upserted<Program>, StoreError> {
        let mut state = self.state.lock().await;
        state.check_rejected(&program.external_id)?;
        let now = state.now();

        if let Some(existing) = state.programs.iter_mut().find(|p| {
            p.provider_platform_id == program.provider_platform_id
                && p.external_id == program.external_id
        }) {
            existing.name = program.name;
            existing.alt_name = program.alt_name;
            existing.description = program.description;
            existing.thumbnail_url = program.thumbnail_url;
            existing.external_url = program.external_url;
            existing.program_type = program.program_type;
            existing.outcome_types = program.outcome_types;
            existing.total_progress_milestones = program.total_progress_milestones;
            existing.updated_at = now;
            return Ok(Upserted {
                entity: existing.clone(),
                created: false,
            });
        }

        let created = Program {
            id: state.next_id(),
            provider_platform_id: program.provider_platform_id,
            name: program.name,
            alt_name: program.alt_name,
            description: program.description,
            external_id: program.external_id,
            thumbnail_url: program.thumbnail_url,
            external_url: program.external_url,
            program_type: program.program_type,
            outcome_types: program.outcome_types,
            total_progress_milestones: program.total_progress_milestones,
            created_at: now,
            updated_at: now,
        };
        state.programs.push(created.clone());
        Ok(Upserted {
            entity: created,
            created: true,
        })
    }

    async fn upsert_milestone(
        &self,
        milestone: NewMilestone,
    ) -> Result<Upserted<Milestone>, StoreError> {
        let mut state = self.state.lock().await;
        state.check_rejected(&milestone.external_id)?;
        let now = state.now();

        if let Some(existing) = state.milestones.iter_mut().find(|m| {
            m.program_id == milestone.program_id
                && m.user_id == milestone.user_id
                && m.external_id == milestone.external_id
        }) {
            existing.milestone_type = milestone.milestone_type;
            existing.is_completed = milestone.is_completed;
            existing.updated_at = now;
            return Ok(Upserted {
                entity: existing.clone(),
                created: false,
            });
        }

        let created = Milestone {
            id: state.next_id(),
            user_id: milestone.user_id,
            program_id: milestone.program_id,
            external_id: milestone.external_id,
            milestone_type: milestone.milestone_type,
            is_completed: milestone.is_completed,
            created_at: now,
            updated_at: now,
        };
        state.milestones.push(created.clone());
        Ok(Upserted {
            entity: created,
            created: true,
        })
    }

    async fn ingest_activity(&self, ingest: ActivityIngest) -> Result<Activity, StoreError> {
        validate_ingest(&ingest)?;
        let mut state = self.state.lock().await;
        if let Some(external_id) = &ingest.external_id {
            state.check_rejected(external_id)?;
        }
        if state.program(ingest.program_id).is_none() {
            return Err(StoreError::NotFound(format!("Program {}", ingest.program_id)));
        }

        let key = ActivityKey::from(&ingest);
        let time_delta = compute_delta(state.totals.get(&key).copied(), ingest.total_time);
        state.totals.insert(key, ingest.total_time);

        let activity = Activity {
            id: state.next_id(),
            user_id: ingest.user_id,
            program_id: ingest.program_id,
            activity_type: ingest.activity_type,
            total_time: ingest.total_time,
            time_delta,
            external_id: ingest.external_id,
            created_at: state.now(),
        };
        state.activities.push(activity.clone());
        Ok(activity)
    }
}

#[async_trait]
impl ActivityStore for InMemoryStore {
    async fn activities_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Activity>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .activities
            .iter()
            .filter(|a| a.user_id == user_id && a.created_at >= from && a.created_at <= to)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DashboardStore for InMemoryStore {
    async fn recent_program_candidates(
        &self,
        user_id: i64,
    ) -> Result<Vec<RecentProgramCandidate>, StoreError> {
        let state = self.state.lock().await;
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for activity in state.activities.iter().filter(|a| a.user_id == user_id) {
            if !seen.insert(activity.program_id) || state.has_outcome(user_id, activity.program_id) {
                continue;
            }
            let Some(program) = state.program(activity.program_id) else {
                continue;
            };
            let completed: Vec<&Milestone> = state
                .milestones
                .iter()
                .filter(|m| {
                    m.user_id == user_id
                        && m.program_id == program.id
                        && m.is_completed
                        && is_progress_milestone(&m.milestone_type)
                })
                .collect();
            candidates.push(RecentProgramCandidate {
                program_id: program.id,
                name: program.name.clone(),
                alt_name: program.alt_name.clone(),
                thumbnail_url: program.thumbnail_url.clone(),
                external_url: program.external_url.clone(),
                provider_platform_name: state.provider_name(program.provider_platform_id),
                total_progress_milestones: program.total_progress_milestones,
                completed_milestones: completed.len() as i64,
                last_completed_at: completed.iter().map(|m| m.updated_at).max(),
            });
        }
        Ok(candidates)
    }

    async fn enrollment_activity(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<EnrollmentActivityRow>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .activities
            .iter()
            .filter(|a| a.user_id == user_id && a.created_at >= since)
            .filter(|a| !state.has_outcome(user_id, a.program_id))
            .filter_map(|a| {
                state.program(a.program_id).map(|p| EnrollmentActivityRow {
                    program_id: p.id,
                    name: p.name.clone(),
                    alt_name: p.alt_name.clone(),
                    thumbnail_url: p.thumbnail_url.clone(),
                    external_url: p.external_url.clone(),
                    provider_platform_name: state.provider_name(p.provider_platform_id),
                    time_delta: a.time_delta,
                })
            })
            .collect())
    }

    async fn milestone_programs(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<EnrolledProgram>, StoreError> {
        let state = self.state.lock().await;
        let mut seen = HashSet::new();
        Ok(state
            .milestones
            .iter()
            .filter(|m| m.user_id == user_id && seen.insert(m.program_id))
            .filter_map(|m| state.program(m.program_id))
            .take(limit)
            .map(|p| EnrolledProgram {
                program_id: p.id,
                name: p.name.clone(),
                alt_name: p.alt_name.clone(),
                thumbnail_url: p.thumbnail_url.clone(),
                external_url: p.external_url.clone(),
                provider_platform_name: state.provider_name(p.provider_platform_id),
            })
            .collect())
    }

    async fn weekly_activity(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<WeeklyActivity>, StoreError> {
        let state = self.state.lock().await;
        let mut by_day = BTreeMap::new();
        for a in state
            .activities
            .iter()
            .filter(|a| a.user_id == user_id && a.created_at >= since)
        {
            *by_day.entry(a.created_at.date_naive()).or_insert(0) += a.time_delta;
        }
        Ok(by_day
            .into_iter()
            .map(|(date, total_time)| WeeklyActivity { date, total_time })
            .collect())
    }
}
