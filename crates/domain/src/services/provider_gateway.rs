//! Read contract for a provider's normalized data API.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    ImportActivity, ImportMilestone, ImportProgram, ImportRecord, ImportUser, SyncContext,
};

/// Errors raised by a provider gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("provider service unreachable: {0}")]
    Unreachable(String),

    #[error("provider service timed out")]
    Timeout,

    #[error("provider service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("undecodable provider response: {0}")]
    Decode(String),

    #[error("invalid provider credentials: {0}")]
    Credentials(String),
}

/// Source of import records for a single provider platform.
///
/// A list that cannot be fetched or is not a list at all is an error; single
/// elements that do not decode come back as [`ImportRecord::Malformed`].
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    fn provider_platform_id(&self) -> i64;

    async fn users(&self, ctx: &SyncContext) -> Result<Vec<ImportRecord<ImportUser>>, GatewayError>;

    async fn programs(&self, ctx: &SyncContext) -> Result<Vec<ImportRecord<ImportProgram>>, GatewayError>;

    async fn milestones(
        &self,
        ctx: &SyncContext,
        external_user_id: &str,
        external_program_id: &str,
    ) -> Result<Vec<ImportRecord<ImportMilestone>>, GatewayError>;

    async fn activity(
        &self,
        ctx: &SyncContext,
        external_program_id: &str,
    ) -> Result<Vec<ImportRecord<ImportActivity>>, GatewayError>;
}
