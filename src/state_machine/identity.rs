use serde::{Deserialize, Serialize};

use crate::messaging::WorkerAddress;
use crate::worker::Role;

/// Per-worker mapping from role to bus address
///
/// Entries start unresolved and are filled only by identity announcements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityTable {
    entries: [Option<WorkerAddress>; Role::COUNT],
}

impl IdentityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `address` for `role`; re-announcing overwrites
    pub fn resolve(&mut self, role: Role, address: WorkerAddress) {
        self.entries[role.index()] = Some(address);
    }

    pub fn get(&self, role: Role) -> Option<WorkerAddress> {
        self.entries[role.index()]
    }

    pub fn resolved_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    /// Barrier condition: every role has an address
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(Option::is_some)
    }

    /// Roles still waiting for an announcement
    pub fn unresolved(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.get(*role).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_starts_unresolved() {
        let table = IdentityTable::new();
        assert_eq!(table.resolved_count(), 0);
        assert!(!table.is_complete());
        assert_eq!(table.unresolved(), Role::ALL.to_vec());
    }

    #[test]
    fn test_table_completes_after_all_roles() {
        let mut table = IdentityTable::new();
        let addresses: Vec<_> = Role::ALL.iter().map(|_| WorkerAddress::new()).collect();

        table.resolve(Role::Sink, addresses[2]);
        table.resolve(Role::Source, addresses[0]);
        assert!(!table.is_complete());
        assert_eq!(table.unresolved(), vec![Role::Transform]);

        table.resolve(Role::Transform, addresses[1]);
        assert!(table.is_complete());
        assert_eq!(table.get(Role::Transform), Some(addresses[1]));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut table = IdentityTable::new();
        let address = WorkerAddress::new();
        table.resolve(Role::Source, address);
        table.resolve(Role::Source, address);
        assert_eq!(table.resolved_count(), 1);
        assert_eq!(table.get(Role::Source), Some(address));
    }
}
