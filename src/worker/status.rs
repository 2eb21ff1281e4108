use serde::{Deserialize, Serialize};

use super::role::Role;
use crate::messaging::WorkerAddress;
use crate::state_machine::WorkerPhase;

/// Observable snapshot of a running worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub role: Role,
    pub address: WorkerAddress,
    pub phase: WorkerPhase,
    /// Set once the startup barrier has been passed
    pub identities_resolved: bool,
    pub items_processed: u64,
    pub events_dispatched: u64,
}

impl WorkerStatus {
    pub fn new(role: Role, address: WorkerAddress) -> Self {
        Self {
            role,
            address,
            phase: WorkerPhase::default(),
            identities_resolved: false,
            items_processed: 0,
            events_dispatched: 0,
        }
    }
}

/// Final statistics returned when a worker is joined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub role: Role,
    pub items_processed: u64,
    pub events_dispatched: u64,
}

impl From<&WorkerStatus> for WorkerReport {
    fn from(status: &WorkerStatus) -> Self {
        Self {
            role: status.role,
            items_processed: status.items_processed,
            events_dispatched: status.events_dispatched,
        }
    }
}
