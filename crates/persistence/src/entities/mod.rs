//! Database entity definitions.

pub mod activity;
pub mod dashboard;
pub mod milestone;
pub mod outcome;
pub mod program;
pub mod provider_platform;
pub mod provider_user_mapping;
pub mod user;

pub use activity::ActivityEntity;
pub use dashboard::{
    EnrolledProgramEntity, EnrollmentActivityEntity, RecentProgramCandidateEntity,
    WeeklyActivityEntity,
};
pub use milestone::{MilestoneEntity, UpsertedMilestoneEntity};
pub use outcome::OutcomeEntity;
pub use program::{ProgramEntity, UpsertedProgramEntity};
pub use provider_platform::ProviderPlatformEntity;
pub use provider_user_mapping::ProviderUserMappingEntity;
pub use user::UserEntity;
