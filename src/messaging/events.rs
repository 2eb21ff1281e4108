use serde::{Deserialize, Serialize};
use std::fmt;

use super::bus::WorkerAddress;
use crate::worker::Role;

/// Control signal forwarded to every worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// End all work and exit
    Terminate,
    /// Stop producing until resumed
    Pause,
    /// Clear a previous pause
    Resume,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [Self::Terminate, Self::Pause, Self::Resume];
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminate => write!(f, "terminate"),
            Self::Pause => write!(f, "pause"),
            Self::Resume => write!(f, "resume"),
        }
    }
}

impl std::str::FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "terminate" => Ok(Self::Terminate),
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            _ => Err(format!("Invalid signal kind: {s}")),
        }
    }
}

/// Events carried by the control bus
///
/// Every event has exactly one addressed destination; the bus never fans out.
/// Broadcasting a signal means sending one event per worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ControlEvent {
    /// Informs a worker of another worker's address
    IdentityAnnouncement { role: Role, address: WorkerAddress },
    /// A control signal forwarded to every worker
    SignalPropagation { signal: SignalKind },
    /// `true` releases the receiver from blocked-on-downstream
    FlowToken { unblock: bool },
}

impl ControlEvent {
    pub fn announce(role: Role, address: WorkerAddress) -> Self {
        Self::IdentityAnnouncement { role, address }
    }

    pub fn signal(signal: SignalKind) -> Self {
        Self::SignalPropagation { signal }
    }

    pub fn unblock() -> Self {
        Self::FlowToken { unblock: true }
    }

    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::IdentityAnnouncement { .. } => "identity_announcement",
            Self::SignalPropagation { .. } => "signal_propagation",
            Self::FlowToken { .. } => "flow_token",
        }
    }
}
