//! At most one import per provider platform at a time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use domain::services::SyncError;

/// Registry of per-provider import locks.
#[derive(Default)]
pub struct ProviderLocks {
    locks: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl ProviderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the provider's lock without waiting. The import holds the
    /// returned guard until it finishes.
    pub fn try_acquire(&self, provider_platform_id: i64) -> Result<OwnedMutexGuard<()>, SyncError> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(provider_platform_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.try_lock_owned()
            .map_err(|_| SyncError::Busy(provider_platform_id))
    }
}
