//! Domain services for edsync.
//!
//! Services contain the import and analytics logic that operates on domain
//! models through the store and gateway seams.

pub mod activity_delta;
pub mod daily_activity;
pub mod dashboard;
pub mod identity;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod provider_gateway;
pub mod provider_sync;
pub mod store;

pub use activity_delta::{compute_delta, validate_ingest, ActivityKey};
pub use daily_activity::{aggregate_daily, daily_activity, daily_range, quartile_for_rank};
pub use dashboard::{assemble_dashboard, DEFAULT_ENROLLMENT_FALLBACK_CAP};
pub use identity::{IdentityMapper, ReconciliationError, UserResolution};
#[cfg(any(test, feature = "test-util"))]
pub use memory::InMemoryStore;
pub use provider_gateway::{GatewayError, ProviderGateway};
pub use provider_sync::{ProviderSync, SyncError};
pub use store::{ActivityStore, DashboardStore, StoreError, SyncStore};
