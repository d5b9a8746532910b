//! Per-tenant lock table.
//!
//! Serializes concurrent reconciliation and publishing for the same
//! tenant. Locks never cross tenants, and the table is never pruned.
//! Tenant names are finite in practice, so unbounded growth here mirrors
//! the growth of the tenant set itself.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Maps tenant name to a dedicated async mutex, created on first use.
#[derive(Default)]
pub struct TenantLockTable {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TenantLockTable {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the mutex for `name`, creating it if this is the first
    /// reference. The same tenant name always yields the same mutex for
    /// the lifetime of the table.
    pub fn get_or_create(&self, name: &str) -> Arc<Mutex<()>> {
        if let Some(existing) = self.locks.get(name) {
            return Arc::clone(&existing);
        }
        Arc::clone(
            self.locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// Number of distinct tenant names with a lock allocated.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether the table holds no locks.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
