//! In-memory record of the last observed identifiers per tenant.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Last observed `releaseId`/`reloadId` for one tenant.
///
/// Both fields start unset and are only ever overwritten, never cleared.
/// There is no operation in the protocol that un-publishes a change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellIdentifier {
    /// Latest release id this process has reconciled against.
    pub release_id: Option<String>,
    /// Latest reload id this process has reconciled against.
    pub reload_id: Option<String>,
}

/// Maps tenant name to its `ShellIdentifier`, created on first use.
#[derive(Default)]
pub struct IdentifierTable {
    entries: DashMap<String, Arc<RwLock<ShellIdentifier>>>,
}

impl IdentifierTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the identifier record for `name`, creating an empty one if
    /// this is the first reference.
    pub fn get_or_create(&self, name: &str) -> Arc<RwLock<ShellIdentifier>> {
        if let Some(existing) = self.entries.get(name) {
            return Arc::clone(&existing);
        }
        Arc::clone(
            self.entries
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(ShellIdentifier::default())))
                .value(),
        )
    }

    /// Snapshot of the current record for `name`, if one has ever been
    /// created.
    pub fn snapshot(&self, name: &str) -> Option<ShellIdentifier> {
        self.entries.get(name).map(|entry| entry.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unset_and_is_stable_per_name() {
        let table = IdentifierTable::new();
        let entry = table.get_or_create("T1");
        assert_eq!(entry.read().release_id, None);
        assert_eq!(entry.read().reload_id, None);

        entry.write().release_id = Some("r1".to_string());

        let again = table.get_or_create("T1");
        assert_eq!(again.read().release_id, Some("r1".to_string()));
    }

    #[test]
    fn snapshot_reflects_latest_write() {
        let table = IdentifierTable::new();
        assert_eq!(table.snapshot("T1"), None);

        let entry = table.get_or_create("T1");
        entry.write().reload_id = Some("l1".to_string());

        let snap = table.snapshot("T1").unwrap();
        assert_eq!(snap.reload_id, Some("l1".to_string()));
        assert_eq!(snap.release_id, None);
    }
}
