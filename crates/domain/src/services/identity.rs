//! Reconciliation of provider identities into internal users.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::models::{ImportUser, MappingUpdate, ProviderUserMapping, User};

use super::store::{StoreError, SyncStore};

#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("record has no username, email or surname")]
    EmptyRecord,

    #[error("record has no external user id")]
    MissingExternalId,

    #[error("no usable username in record")]
    MissingUsername,

    #[error("no mapping for user {user_id} on provider {provider_platform_id}")]
    MappingNotFound {
        user_id: i64,
        provider_platform_id: i64,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of resolving an import user.
#[derive(Debug, Clone)]
pub enum UserResolution {
    /// A mapping already existed for the external id.
    Existing(ProviderUserMapping),
    /// A new user and mapping were created.
    Created(User, ProviderUserMapping),
}

impl UserResolution {
    pub fn user_id(&self) -> i64 {
        match self {
            UserResolution::Existing(m) => m.user_id,
            UserResolution::Created(u, _) => u.id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, UserResolution::Created(..))
    }
}

/// Maps provider user identifiers to internal users.
#[derive(Clone)]
pub struct IdentityMapper {
    store: Arc<dyn SyncStore>,
    default_email_domain: String,
}

impl IdentityMapper {
    pub fn new(store: Arc<dyn SyncStore>, default_email_domain: impl Into<String>) -> Self {
        Self {
            store,
            default_email_domain: default_email_domain.into(),
        }
    }

    /// Returns the user mapped to the external id, creating user and mapping
    /// when none exists.
    pub async fn resolve_or_create_user(
        &self,
        provider_platform_id: i64,
        record: &ImportUser,
    ) -> Result<UserResolution, ReconciliationError> {
        if record.is_empty() {
            return Err(ReconciliationError::EmptyRecord);
        }
        let identity = record.identity(provider_platform_id);
        if identity.external_user_id.is_empty() {
            return Err(ReconciliationError::MissingExternalId);
        }

        if let Some(mapping) = self
            .store
            .find_mapping_by_external(provider_platform_id, &identity.external_user_id)
            .await?
        {
            return Ok(UserResolution::Existing(mapping));
        }

        let new_user = record
            .to_new_user(&self.default_email_domain)
            .ok_or(ReconciliationError::MissingUsername)?;
        let (user, mapping) = self.store.create_user_with_mapping(new_user, identity).await?;
        tracing::debug!(
            provider_platform_id,
            user_id = user.id,
            external_user_id = %mapping.external_user_id,
            "Created user from provider record"
        );
        Ok(UserResolution::Created(user, mapping))
    }

    pub async fn mappings_for_provider(
        &self,
        provider_platform_id: i64,
    ) -> Result<Vec<ProviderUserMapping>, ReconciliationError> {
        Ok(self.store.mappings_for_provider(provider_platform_id).await?)
    }

    /// External user id to internal user id for one provider.
    pub async fn lookup_table(
        &self,
        provider_platform_id: i64,
    ) -> Result<HashMap<String, i64>, ReconciliationError> {
        Ok(self
            .mappings_for_provider(provider_platform_id)
            .await?
            .into_iter()
            .map(|m| (m.external_user_id, m.user_id))
            .collect())
    }

    pub async fn mapping(
        &self,
        user_id: i64,
        provider_platform_id: i64,
    ) -> Result<ProviderUserMapping, ReconciliationError> {
        self.store
            .mapping_for_user(user_id, provider_platform_id)
            .await?
            .ok_or(ReconciliationError::MappingNotFound {
                user_id,
                provider_platform_id,
            })
    }

    /// Applies an explicit update. Fails when the mapping does not exist.
    pub async fn update_mapping(
        &self,
        user_id: i64,
        provider_platform_id: i64,
        update: &MappingUpdate,
    ) -> Result<ProviderUserMapping, ReconciliationError> {
        match self
            .store
            .update_mapping(user_id, provider_platform_id, update)
            .await
        {
            Err(StoreError::NotFound(_)) => Err(ReconciliationError::MappingNotFound {
                user_id,
                provider_platform_id,
            }),
            other => Ok(other?),
        }
    }
}
