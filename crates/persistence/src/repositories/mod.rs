//! Repository implementations for database operations.

pub mod activity;
pub mod dashboard;
pub mod milestone;
pub mod outcome;
pub mod program;
pub mod provider_platform;
pub mod provider_user_mapping;
pub mod user;

pub use activity::ActivityRepository;
pub use dashboard::DashboardRepository;
pub use milestone::MilestoneRepository;
pub use outcome::OutcomeRepository;
pub use program::ProgramRepository;
pub use provider_platform::ProviderPlatformRepository;
pub use provider_user_mapping::ProviderUserMappingRepository;
pub use user::UserRepository;
