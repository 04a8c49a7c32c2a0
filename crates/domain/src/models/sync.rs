//! Import run models: phases, context and per-phase reports.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four ordered import phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Users,
    Programs,
    Milestones,
    Activity,
}

impl SyncPhase {
    /// Order used by a full sync.
    pub const ORDERED: [SyncPhase; 4] = [
        SyncPhase::Users,
        SyncPhase::Programs,
        SyncPhase::Milestones,
        SyncPhase::Activity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Users => "users",
            SyncPhase::Programs => "programs",
            SyncPhase::Milestones => "milestones",
            SyncPhase::Activity => "activity",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation fields carried through a sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncContext {
    pub request_id: String,
    pub provider_platform_id: i64,
}

impl SyncContext {
    pub fn new(request_id: impl Into<String>, provider_platform_id: i64) -> Self {
        Self {
            request_id: request_id.into(),
            provider_platform_id,
        }
    }

    /// Span for one phase of this run.
    pub fn phase_span(&self, phase: SyncPhase) -> tracing::Span {
        tracing::info_span!(
            "provider_import",
            request_id = %self.request_id,
            provider_platform_id = self.provider_platform_id,
            phase = phase.as_str(),
        )
    }
}

/// A record that failed and was skipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordError {
    /// Position of the record in the gateway response.
    pub index: usize,
    pub external_id: String,
    pub message: String,
}

/// Outcome of one phase. Returned even when some records failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: SyncPhase,
    pub provider_platform_id: i64,
    pub processed: usize,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unmapped: usize,
    pub cancelled: bool,
    pub errors: Vec<RecordError>,
}

impl PhaseReport {
    pub fn new(phase: SyncPhase, provider_platform_id: i64) -> Self {
        Self {
            phase,
            provider_platform_id,
            processed: 0,
            created: 0,
            skipped: 0,
            failed: 0,
            unmapped: 0,
            cancelled: false,
            errors: Vec::new(),
        }
    }

    pub fn record_failure(
        &mut self,
        index: usize,
        external_id: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.failed += 1;
        self.errors.push(RecordError {
            index,
            external_id: external_id.into(),
            message: message.into(),
        });
    }

    /// Records that were persisted or already present.
    pub fn succeeded(&self) -> usize {
        self.processed
            .saturating_sub(self.failed + self.skipped + self.unmapped)
    }
}

/// Reports of a full ordered sync, one per completed phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FullSyncReport {
    pub provider_platform_id: i64,
    pub phases: Vec<PhaseReport>,
    pub cancelled: bool,
    /// Phase that aborted the run, if any. Later phases were not started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted_phase: Option<SyncPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of an upsert: the stored entity and whether it was newly inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<T> {
    pub entity: T,
    pub created: bool,
}
