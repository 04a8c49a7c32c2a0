//! Services owned by the HTTP layer.

pub mod provider_client;
pub mod provider_locks;

pub use provider_client::{
    GatewayFactory, HttpGatewayFactory, ProviderServiceClient, ProviderServiceDescriptor,
};
pub use provider_locks::ProviderLocks;
