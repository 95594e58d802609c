//! Per-tenant advisory locks
//!
//! Serializes clones into the same target tenant within one process.
//! Cross-process serialization of category inserts is the store's job
//! (see `PgCatalog::insert_many`).

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct TenantLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl TenantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and hold the tenant's lock until the guard drops
    pub async fn acquire(&self, tenant_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(tenant_id.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    pub fn is_locked(&self, tenant_id: &str) -> bool {
        self.locks
            .get(tenant_id)
            .is_some_and(|lock| lock.try_lock().is_err())
    }
}
