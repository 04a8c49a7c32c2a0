//! Domain models for edsync.

pub mod activity;
pub mod dashboard;
pub mod import;
pub mod milestone;
pub mod outcome;
pub mod program;
pub mod provider_platform;
pub mod provider_user_mapping;
pub mod sync;
pub mod user;

pub use activity::{Activity, ActivityIngest, CreateActivityRequest, DailyActivity, DailyActivityQuery};
pub use dashboard::{
    CurrentEnrollment, EnrolledProgram, EnrollmentActivityRow, RecentProgram,
    RecentProgramCandidate, UserDashboard, WeeklyActivity,
};
pub use import::{ImportActivity, ImportMilestone, ImportProgram, ImportRecord, ImportUser};
pub use milestone::{Milestone, MilestonePatch, NewMilestone};
pub use outcome::{CreateOutcomeRequest, Outcome, OutcomeFilter, OutcomePatch, OutcomeType};
pub use program::{NewProgram, Program, ProgramPatch, ProgramType};
pub use provider_platform::{
    CreateProviderPlatformRequest, ProviderPlatform, ProviderPlatformPatch, ProviderPlatformState,
    ProviderPlatformType,
};
pub use provider_user_mapping::{
    CreateMappingRequest, ExternalIdentity, MappingUpdate, NewProviderUserMapping, ProviderUserMapping,
};
pub use sync::{FullSyncReport, PhaseReport, RecordError, SyncContext, SyncPhase, Upserted};
pub use user::{NewUser, User};
