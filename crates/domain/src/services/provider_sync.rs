//! Provider import orchestrator.
//!
//! Runs the users, programs, milestones and activity phases for one provider.
//! A failed gateway fetch at the start of a phase aborts that phase; any other
//! failure is recorded against the record and the phase moves on.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::models::{
    ActivityIngest, FullSyncReport, ImportRecord, NewMilestone, NewProgram, PhaseReport,
    SyncContext, SyncPhase,
};

use super::identity::{IdentityMapper, ReconciliationError};
use super::provider_gateway::{GatewayError, ProviderGateway};
use super::store::{StoreError, SyncStore};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{phase} import for provider {provider_platform_id} failed: {source}")]
    Gateway {
        phase: SyncPhase,
        provider_platform_id: i64,
        #[source]
        source: GatewayError,
    },

    #[error("{phase} import for provider {provider_platform_id} could not load state: {source}")]
    Store {
        phase: SyncPhase,
        provider_platform_id: i64,
        #[source]
        source: StoreError,
    },

    #[error("an import is already running for provider {0}")]
    Busy(i64),
}

impl SyncError {
    pub fn phase(&self) -> Option<SyncPhase> {
        match self {
            SyncError::Gateway { phase, .. } | SyncError::Store { phase, .. } => Some(*phase),
            SyncError::Busy(_) => None,
        }
    }
}

fn record_outcome(phase: SyncPhase, outcome: &'static str) {
    counter!(
        "provider_import_records_total",
        "phase" => phase.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Returns the decoded record, or records the element as failed.
fn accept_record<'a, T>(
    phase: SyncPhase,
    report: &mut PhaseReport,
    index: usize,
    record: &'a ImportRecord<T>,
) -> Option<&'a T> {
    match record {
        ImportRecord::Valid(record) => Some(record),
        ImportRecord::Malformed {
            external_id,
            reason,
        } => {
            tracing::warn!(index, external_id = %external_id, error = %reason, "Skipping malformed record");
            report.record_failure(index, external_id.clone(), format!("malformed record: {}", reason));
            record_outcome(phase, "malformed");
            None
        }
    }
}

/// One import run against a single provider.
pub struct ProviderSync {
    gateway: Arc<dyn ProviderGateway>,
    store: Arc<dyn SyncStore>,
    identity: IdentityMapper,
    ctx: SyncContext,
    cancel: CancellationToken,
}

impl ProviderSync {
    pub fn new(
        gateway: Arc<dyn ProviderGateway>,
        store: Arc<dyn SyncStore>,
        default_email_domain: &str,
        request_id: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        let ctx = SyncContext::new(request_id, gateway.provider_platform_id());
        Self {
            identity: IdentityMapper::new(store.clone(), default_email_domain),
            gateway,
            store,
            ctx,
            cancel,
        }
    }

    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    fn provider_platform_id(&self) -> i64 {
        self.ctx.provider_platform_id
    }

    fn gateway_error(&self, phase: SyncPhase, source: GatewayError) -> SyncError {
        SyncError::Gateway {
            phase,
            provider_platform_id: self.provider_platform_id(),
            source,
        }
    }

    fn store_error(&self, phase: SyncPhase, source: StoreError) -> SyncError {
        SyncError::Store {
            phase,
            provider_platform_id: self.provider_platform_id(),
            source,
        }
    }

    pub async fn run_phase(&self, phase: SyncPhase) -> Result<PhaseReport, SyncError> {
        let span = self.ctx.phase_span(phase);
        async {
            let report = match phase {
                SyncPhase::Users => self.import_users().await,
                SyncPhase::Programs => self.import_programs().await,
                SyncPhase::Milestones => self.import_milestones().await,
                SyncPhase::Activity => self.import_activity().await,
            }?;
            tracing::info!(
                processed = report.processed,
                created = report.created,
                skipped = report.skipped,
                failed = report.failed,
                unmapped = report.unmapped,
                cancelled = report.cancelled,
                "Import phase finished"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Runs every phase in order. Stops after a cancelled phase or a phase
    /// that aborted; reports of completed phases are kept.
    pub async fn full_sync(&self) -> FullSyncReport {
        let mut report = FullSyncReport {
            provider_platform_id: self.provider_platform_id(),
            phases: Vec::with_capacity(SyncPhase::ORDERED.len()),
            cancelled: false,
            aborted_phase: None,
            error: None,
        };
        for phase in SyncPhase::ORDERED {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            match self.run_phase(phase).await {
                Ok(phase_report) => {
                    let cancelled = phase_report.cancelled;
                    report.phases.push(phase_report);
                    if cancelled {
                        report.cancelled = true;
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        request_id = %self.ctx.request_id,
                        provider_platform_id = self.provider_platform_id(),
                        phase = phase.as_str(),
                        error = %e,
                        "Full sync aborted"
                    );
                    report.aborted_phase = Some(phase);
                    report.error = Some(e.to_string());
                    break;
                }
            }
        }
        report
    }

    pub async fn import_users(&self) -> Result<PhaseReport, SyncError> {
        let phase = SyncPhase::Users;
        let users = self
            .gateway
            .users(&self.ctx)
            .await
            .map_err(|e| self.gateway_error(phase, e))?;

        let mut report = PhaseReport::new(phase, self.provider_platform_id());
        for (index, record) in users.iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            report.processed += 1;
            let Some(record) = accept_record(phase, &mut report, index, record) else {
                continue;
            };
            match self
                .identity
                .resolve_or_create_user(self.provider_platform_id(), record)
                .await
            {
                Ok(resolution) if resolution.is_created() => {
                    report.created += 1;
                    record_outcome(phase, "created");
                }
                Ok(_) => record_outcome(phase, "existing"),
                Err(ReconciliationError::EmptyRecord) => {
                    report.skipped += 1;
                    record_outcome(phase, "skipped");
                }
                Err(e) => {
                    tracing::warn!(
                        external_user_id = %record.external_user_id,
                        error = %e,
                        "Skipping user record"
                    );
                    report.record_failure(index, record.external_user_id.clone(), e.to_string());
                    record_outcome(phase, "failed");
                }
            }
        }
        Ok(report)
    }

    pub async fn import_programs(&self) -> Result<PhaseReport, SyncError> {
        let phase = SyncPhase::Programs;
        let programs = self
            .gateway
            .programs(&self.ctx)
            .await
            .map_err(|e| self.gateway_error(phase, e))?;

        let mut report = PhaseReport::new(phase, self.provider_platform_id());
        for (index, record) in programs.iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            report.processed += 1;
            let Some(record) = accept_record(phase, &mut report, index, record) else {
                continue;
            };
            let result = match (record.parsed_program_type(), record.external_id.trim()) {
                (_, "") => Err("program has no external id".to_string()),
                (Err(e), _) => Err(e),
                (Ok(program_type), external_id) => self
                    .store
                    .upsert_program(NewProgram {
                        provider_platform_id: self.provider_platform_id(),
                        name: record.name.clone(),
                        alt_name: record.alt_name.clone(),
                        description: record.description.clone(),
                        external_id: external_id.to_string(),
                        thumbnail_url: record.thumbnail_url.clone(),
                        external_url: record.external_url.clone(),
                        program_type,
                        outcome_types: record.joined_outcome_types(),
                        total_progress_milestones: record.total_progress_milestones.max(0),
                    })
                    .await
                    .map_err(|e| e.to_string()),
            };
            match result {
                Ok(upserted) => {
                    if upserted.created {
                        report.created += 1;
                        record_outcome(phase, "created");
                    } else {
                        record_outcome(phase, "updated");
                    }
                }
                Err(message) => {
                    tracing::warn!(external_id = %record.external_id, error = %message, "Skipping program record");
                    report.record_failure(index, record.external_id.clone(), message);
                    record_outcome(phase, "failed");
                }
            }
        }
        Ok(report)
    }

    pub async fn import_milestones(&self) -> Result<PhaseReport, SyncError> {
        let phase = SyncPhase::Milestones;
        let programs = self
            .store
            .programs_for_provider(self.provider_platform_id())
            .await
            .map_err(|e| self.store_error(phase, e))?;
        let mappings = self
            .store
            .mappings_for_provider(self.provider_platform_id())
            .await
            .map_err(|e| self.store_error(phase, e))?;

        let mut report = PhaseReport::new(phase, self.provider_platform_id());
        'pairs: for program in &programs {
            for mapping in &mappings {
                if self.cancel.is_cancelled() {
                    report.cancelled = true;
                    break 'pairs;
                }
                let milestones = match self
                    .gateway
                    .milestones(&self.ctx, &mapping.external_user_id, &program.external_id)
                    .await
                {
                    Ok(milestones) => milestones,
                    Err(e) => {
                        tracing::warn!(
                            program_id = program.id,
                            user_id = mapping.user_id,
                            error = %e,
                            "Skipping milestones for program and user"
                        );
                        report.processed += 1;
                        report.record_failure(
                            report.processed - 1,
                            format!("{}/{}", program.external_id, mapping.external_user_id),
                            e.to_string(),
                        );
                        record_outcome(phase, "failed");
                        continue;
                    }
                };

                for record in &milestones {
                    if self.cancel.is_cancelled() {
                        report.cancelled = true;
                        break 'pairs;
                    }
                    let index = report.processed;
                    report.processed += 1;
                    let Some(record) = accept_record(phase, &mut report, index, record) else {
                        continue;
                    };
                    let result = self
                        .store
                        .upsert_milestone(NewMilestone {
                            user_id: mapping.user_id,
                            program_id: program.id,
                            external_id: record.external_id.clone(),
                            milestone_type: record.milestone_type.clone(),
                            is_completed: record.is_completed,
                        })
                        .await;
                    match result {
                        Ok(upserted) if upserted.created => {
                            report.created += 1;
                            record_outcome(phase, "created");
                        }
                        Ok(_) => record_outcome(phase, "updated"),
                        Err(e) => {
                            tracing::warn!(external_id = %record.external_id, error = %e, "Skipping milestone record");
                            report.record_failure(index, record.external_id.clone(), e.to_string());
                            record_outcome(phase, "failed");
                        }
                    }
                }
            }
        }
        Ok(report)
    }

    pub async fn import_activity(&self) -> Result<PhaseReport, SyncError> {
        let phase = SyncPhase::Activity;
        let programs = self
            .store
            .programs_for_provider(self.provider_platform_id())
            .await
            .map_err(|e| self.store_error(phase, e))?;
        let users = match self.identity.lookup_table(self.provider_platform_id()).await {
            Ok(users) => users,
            Err(ReconciliationError::Store(e)) => return Err(self.store_error(phase, e)),
            Err(e) => return Err(self.store_error(phase, StoreError::Invalid(e.to_string()))),
        };

        let mut report = PhaseReport::new(phase, self.provider_platform_id());
        'programs: for program in &programs {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let activity = match self.gateway.activity(&self.ctx, &program.external_id).await {
                Ok(activity) => activity,
                Err(e) => {
                    tracing::warn!(program_id = program.id, error = %e, "Skipping activity for program");
                    report.processed += 1;
                    report.record_failure(report.processed - 1, program.external_id.clone(), e.to_string());
                    record_outcome(phase, "failed");
                    continue;
                }
            };

            for record in &activity {
                if self.cancel.is_cancelled() {
                    report.cancelled = true;
                    break 'programs;
                }
                let index = report.processed;
                report.processed += 1;
                let Some(record) = accept_record(phase, &mut report, index, record) else {
                    continue;
                };
                let Some(&user_id) = users.get(&record.external_user_id) else {
                    tracing::warn!(
                        external_user_id = %record.external_user_id,
                        program_id = program.id,
                        "No mapping for activity record, skipping"
                    );
                    report.unmapped += 1;
                    record_outcome(phase, "unmapped");
                    continue;
                };
                let result = self
                    .store
                    .ingest_activity(ActivityIngest {
                        user_id,
                        program_id: program.id,
                        activity_type: record.activity_type.clone(),
                        total_time: record.total_time,
                        external_id: record.external_id.clone().filter(|s| !s.is_empty()),
                    })
                    .await;
                match result {
                    Ok(_) => {
                        report.created += 1;
                        record_outcome(phase, "created");
                    }
                    Err(e) => {
                        tracing::warn!(
                            external_user_id = %record.external_user_id,
                            program_id = program.id,
                            error = %e,
                            "Skipping activity record"
                        );
                        report.record_failure(index, record.external_user_id.clone(), e.to_string());
                        record_outcome(phase, "failed");
                    }
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImportActivity, ImportMilestone, ImportProgram, ImportUser};
    use crate::services::memory::InMemoryStore;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::{HashMap, HashSet};

    const PROVIDER: i64 = 7;

    #[derive(Default)]
    struct ScriptedGateway {
        users: Option<Vec<ImportUser>>,
        programs: Option<Vec<ImportProgram>>,
        milestones: HashMap<(String, String), Vec<ImportMilestone>>,
        failing_pairs: HashSet<(String, String)>,
        activity: HashMap<String, Vec<ImportActivity>>,
        failing_programs: HashSet<String>,
        cancel_on_programs: Option<CancellationToken>,
        raw_users: Option<Vec<Value>>,
        raw_programs: Option<Vec<Value>>,
        raw_activity: HashMap<String, Vec<Value>>,
    }

    fn scripted<T: Clone>(records: &[T]) -> Vec<ImportRecord<T>> {
        records.iter().cloned().map(ImportRecord::from).collect()
    }

    fn unreachable() -> GatewayError {
        GatewayError::Unreachable("connection refused".to_string())
    }

    #[async_trait]
    impl ProviderGateway for ScriptedGateway {
        fn provider_platform_id(&self) -> i64 {
            PROVIDER
        }

        async fn users(
            &self,
            _ctx: &SyncContext,
        ) -> Result<Vec<ImportRecord<ImportUser>>, GatewayError> {
            if let Some(raw) = &self.raw_users {
                return Ok(ImportRecord::decode_all(raw.clone()));
            }
            self.users.as_deref().map(scripted).ok_or_else(unreachable)
        }

        async fn programs(
            &self,
            _ctx: &SyncContext,
        ) -> Result<Vec<ImportRecord<ImportProgram>>, GatewayError> {
            if let Some(token) = &self.cancel_on_programs {
                token.cancel();
            }
            if let Some(raw) = &self.raw_programs {
                return Ok(ImportRecord::decode_all(raw.clone()));
            }
            self.programs.as_deref().map(scripted).ok_or_else(unreachable)
        }

        async fn milestones(
            &self,
            _ctx: &SyncContext,
            external_user_id: &str,
            external_program_id: &str,
        ) -> Result<Vec<ImportRecord<ImportMilestone>>, GatewayError> {
            let key = (external_user_id.to_string(), external_program_id.to_string());
            if self.failing_pairs.contains(&key) {
                return Err(GatewayError::Timeout);
            }
            Ok(self
                .milestones
                .get(&key)
                .map(|m| scripted(m))
                .unwrap_or_default())
        }

        async fn activity(
            &self,
            _ctx: &SyncContext,
            external_program_id: &str,
        ) -> Result<Vec<ImportRecord<ImportActivity>>, GatewayError> {
            if self.failing_programs.contains(external_program_id) {
                return Err(GatewayError::Status {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            if let Some(raw) = self.raw_activity.get(external_program_id) {
                return Ok(ImportRecord::decode_all(raw.clone()));
            }
            Ok(self
                .activity
                .get(external_program_id)
                .map(|a| scripted(a))
                .unwrap_or_default())
        }
    }

    fn user(ext: &str, username: &str) -> ImportUser {
        ImportUser {
            username: username.to_string(),
            email: format!("{}@school.example", username),
            name_first: "Ada".to_string(),
            name_last: "Lovelace".to_string(),
            external_user_id: ext.to_string(),
            external_username: username.to_string(),
        }
    }

    fn program(ext: &str, program_type: &str) -> ImportProgram {
        ImportProgram {
            name: format!("Course {}", ext),
            alt_name: String::new(),
            description: String::new(),
            external_id: ext.to_string(),
            thumbnail_url: String::new(),
            external_url: String::new(),
            program_type: program_type.to_string(),
            outcome_types: vec!["grade".to_string(), "certificate".to_string()],
            total_progress_milestones: 5,
        }
    }

    fn milestone(ext: &str, completed: bool) -> ImportMilestone {
        ImportMilestone {
            external_id: ext.to_string(),
            milestone_type: "assignment_submission".to_string(),
            is_completed: completed,
        }
    }

    fn activity(ext_user: &str, total: i64) -> ImportActivity {
        ImportActivity {
            external_user_id: ext_user.to_string(),
            activity_type: "interaction".to_string(),
            total_time: total,
            external_id: None,
        }
    }

    fn sync(gateway: ScriptedGateway, store: Arc<InMemoryStore>) -> ProviderSync {
        ProviderSync::new(
            Arc::new(gateway),
            store,
            "imported.local",
            "req-1",
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_import_users_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let gateway = || ScriptedGateway {
            users: Some(vec![user("u1", "ada"), user("u2", "grace")]),
            ..Default::default()
        };

        let first = sync(gateway(), store.clone()).import_users().await.unwrap();
        let second = sync(gateway(), store.clone()).import_users().await.unwrap();

        assert_eq!(first.created, 2);
        assert_eq!(second.created, 0);
        assert_eq!(second.succeeded(), 2);
        assert_eq!(store.user_count().await, 2);
    }

    #[tokio::test]
    async fn test_import_users_continues_past_bad_record() {
        let store = Arc::new(InMemoryStore::new());
        store.reject_external_id("u2").await;
        let gateway = ScriptedGateway {
            users: Some(vec![user("u1", "ada"), user("u2", "grace"), user("u3", "alan")]),
            ..Default::default()
        };

        let report = sync(gateway, store.clone()).import_users().await.unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].index, 1);
        assert_eq!(report.errors[0].external_id, "u2");
        assert_eq!(store.user_count().await, 2);
    }

    #[tokio::test]
    async fn test_import_programs_skips_malformed_element() {
        let store = Arc::new(InMemoryStore::new());
        let gateway = ScriptedGateway {
            raw_programs: Some(vec![
                json!({ "name": "A", "external_id": "c1", "type": "fixed_grade" }),
                json!({ "name": "B", "type": "fixed_grade" }),
                json!({ "name": "C", "external_id": "c3", "type": "open_content" }),
            ]),
            ..Default::default()
        };

        let report = sync(gateway, store.clone()).import_programs().await.unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].index, 1);
        assert!(report.errors[0].message.starts_with("malformed record"));
        assert_eq!(store.programs().await.len(), 2);
    }

    #[tokio::test]
    async fn test_import_users_skips_malformed_element() {
        let store = Arc::new(InMemoryStore::new());
        let gateway = ScriptedGateway {
            raw_users: Some(vec![
                json!({ "username": "ada", "name_last": "Lovelace", "external_user_id": "u1" }),
                json!({ "username": ["not", "a", "string"], "external_user_id": "u2" }),
                json!({ "username": "alan", "name_last": "Turing", "external_user_id": "u3" }),
            ]),
            ..Default::default()
        };

        let report = sync(gateway, store.clone()).import_users().await.unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].external_id, "u2");
        assert_eq!(store.user_count().await, 2);
    }

    #[tokio::test]
    async fn test_import_activity_skips_null_total() {
        let store = Arc::new(InMemoryStore::new());
        let mut gateway = ScriptedGateway {
            users: Some(vec![user("u1", "ada"), user("u2", "grace")]),
            programs: Some(vec![program("c1", "fixed_grade")]),
            ..Default::default()
        };
        gateway.raw_activity.insert(
            "c1".to_string(),
            vec![
                json!({ "external_user_id": "u1", "type": "interaction", "total_time": 90 }),
                json!({ "external_user_id": "u2", "type": "interaction", "total_time": null }),
                json!({ "external_user_id": "u2", "type": "interaction", "total_time": 30 }),
            ],
        );
        let run = sync(gateway, store.clone());
        run.import_users().await.unwrap();
        run.import_programs().await.unwrap();

        let report = run.import_activity().await.unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].index, 1);
        let deltas: Vec<i64> = store.activities().await.iter().map(|a| a.time_delta).collect();
        assert_eq!(deltas, vec![90, 30]);
    }

    #[tokio::test]
    async fn test_import_users_skips_empty_records() {
        let store = Arc::new(InMemoryStore::new());
        let gateway = ScriptedGateway {
            users: Some(vec![
                ImportUser {
                    name_first: "Nobody".to_string(),
                    external_user_id: "u0".to_string(),
                    ..Default::default()
                },
                user("u1", "ada"),
            ]),
            ..Default::default()
        };
        let report = sync(gateway, store).import_users().await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 1);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_gateway_failure_aborts_phase() {
        let store = Arc::new(InMemoryStore::new());
        let err = sync(ScriptedGateway::default(), store)
            .import_users()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Gateway {
                phase: SyncPhase::Users,
                provider_platform_id: PROVIDER,
                ..
            }
        ));
        assert!(err.to_string().contains("users import for provider 7"));
    }

    #[tokio::test]
    async fn test_import_programs_records_bad_type() {
        let store = Arc::new(InMemoryStore::new());
        let gateway = ScriptedGateway {
            programs: Some(vec![
                program("c1", "fixed_grade"),
                program("c2", "semester"),
                program("c3", "open_content"),
            ]),
            ..Default::default()
        };
        let report = sync(gateway, store.clone()).import_programs().await.unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 1);
        let programs = store.programs().await;
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].outcome_types, "grade,certificate");
        assert_eq!(programs[0].provider_platform_id, PROVIDER);
    }

    #[tokio::test]
    async fn test_import_milestones_skips_failed_pair_only() {
        let store = Arc::new(InMemoryStore::new());
        let mut gateway = ScriptedGateway {
            users: Some(vec![user("u1", "ada"), user("u2", "grace")]),
            programs: Some(vec![program("c1", "fixed_grade")]),
            ..Default::default()
        };
        gateway.milestones.insert(
            ("u1".to_string(), "c1".to_string()),
            vec![milestone("s1", true), milestone("s2", false)],
        );
        gateway
            .failing_pairs
            .insert(("u2".to_string(), "c1".to_string()));
        let run = sync(gateway, store.clone());
        run.import_users().await.unwrap();
        run.import_programs().await.unwrap();

        let report = run.import_milestones().await.unwrap();
        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].external_id, "c1/u2");

        let again = run.import_milestones().await.unwrap();
        assert_eq!(again.created, 0);
        assert_eq!(store.milestones().await.len(), 2);
    }

    #[tokio::test]
    async fn test_import_activity_computes_deltas_and_counts_unmapped() {
        let store = Arc::new(InMemoryStore::new());
        let mut gateway = ScriptedGateway {
            users: Some(vec![user("u1", "ada")]),
            programs: Some(vec![program("c1", "fixed_grade"), program("c2", "fixed_grade")]),
            ..Default::default()
        };
        gateway
            .activity
            .insert("c1".to_string(), vec![activity("u1", 100), activity("ghost", 40)]);
        gateway.failing_programs.insert("c2".to_string());
        let run = sync(gateway, store.clone());
        run.import_users().await.unwrap();
        run.import_programs().await.unwrap();

        let report = run.import_activity().await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.unmapped, 1);
        assert_eq!(report.failed, 1);

        let rerun = run.import_activity().await.unwrap();
        assert_eq!(rerun.created, 1);
        let deltas: Vec<i64> = store.activities().await.iter().map(|a| a.time_delta).collect();
        assert_eq!(deltas, vec![100, 0]);
        assert!(store.activities().await.iter().all(|a| a.user_id != 0));
    }

    #[tokio::test]
    async fn test_full_sync_runs_phases_in_order() {
        let store = Arc::new(InMemoryStore::new());
        let mut gateway = ScriptedGateway {
            users: Some(vec![user("u1", "ada")]),
            programs: Some(vec![program("c1", "open_enrollment")]),
            ..Default::default()
        };
        gateway
            .milestones
            .insert(("u1".to_string(), "c1".to_string()), vec![milestone("s1", true)]);
        gateway.activity.insert("c1".to_string(), vec![activity("u1", 60)]);

        let report = sync(gateway, store.clone()).full_sync().await;

        let phases: Vec<SyncPhase> = report.phases.iter().map(|p| p.phase).collect();
        assert_eq!(phases, SyncPhase::ORDERED.to_vec());
        assert!(report.aborted_phase.is_none());
        assert_eq!(store.activities().await[0].time_delta, 60);
    }

    #[tokio::test]
    async fn test_full_sync_stops_after_aborted_phase() {
        let store = Arc::new(InMemoryStore::new());
        let gateway = ScriptedGateway {
            users: Some(vec![user("u1", "ada")]),
            programs: None,
            ..Default::default()
        };

        let report = sync(gateway, store.clone()).full_sync().await;

        assert_eq!(report.phases.len(), 1);
        assert_eq!(report.aborted_phase, Some(SyncPhase::Programs));
        assert!(report.error.is_some());
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_cancellation_keeps_committed_work() {
        let store = Arc::new(InMemoryStore::new());
        let token = CancellationToken::new();
        let gateway = ScriptedGateway {
            users: Some(vec![user("u1", "ada"), user("u2", "grace")]),
            programs: Some(vec![program("c1", "fixed_grade")]),
            cancel_on_programs: Some(token.clone()),
            ..Default::default()
        };
        let run = ProviderSync::new(Arc::new(gateway), store.clone(), "imported.local", "req-2", token);

        let report = run.full_sync().await;

        assert!(report.cancelled);
        assert_eq!(report.phases.len(), 2);
        assert!(report.phases[1].cancelled);
        assert_eq!(report.phases[1].processed, 0);
        assert_eq!(store.user_count().await, 2);
        assert!(store.programs().await.is_empty());
    }
}
