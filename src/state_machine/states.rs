use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse worker phase derived from [`WorkerState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPhase {
    /// Waiting for a flow token from the peer it feeds
    Blocked,
    /// Held by a Pause signal
    Paused,
    /// Free to perform one unit of pipeline work
    Running,
    /// Exited or about to exit; never left once entered
    Terminated,
}

impl WorkerPhase {
    /// Check if this is a terminal phase (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Check if the worker idles in this phase
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Blocked | Self::Paused)
    }
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocked => write!(f, "blocked"),
            Self::Paused => write!(f, "paused"),
            Self::Running => write!(f, "running"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

impl std::str::FromStr for WorkerPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocked" => Ok(Self::Blocked),
            "paused" => Ok(Self::Paused),
            "running" => Ok(Self::Running),
            "terminated" => Ok(Self::Terminated),
            _ => Err(format!("Invalid worker phase: {s}")),
        }
    }
}

impl Default for WorkerPhase {
    fn default() -> Self {
        Self::Blocked
    }
}

/// Per-worker flags, owned and mutated by that worker only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerState {
    paused: bool,
    blocked_on_downstream: bool,
    terminated: bool,
}

impl Default for WorkerState {
    /// Workers start blocked until their first flow token arrives
    fn default() -> Self {
        Self {
            paused: false,
            blocked_on_downstream: true,
            terminated: false,
        }
    }
}

impl WorkerState {
    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn blocked_on_downstream(&self) -> bool {
        self.blocked_on_downstream
    }

    pub fn terminated(&self) -> bool {
        self.terminated
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_blocked_on_downstream(&mut self, blocked: bool) {
        self.blocked_on_downstream = blocked;
    }

    /// Latch the terminated flag; it is never cleared
    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    /// Pipeline work is allowed only when no flag holds
    pub fn can_work(&self) -> bool {
        !self.paused && !self.blocked_on_downstream && !self.terminated
    }

    /// Phase with precedence terminated > paused > blocked
    pub fn phase(&self) -> WorkerPhase {
        if self.terminated {
            WorkerPhase::Terminated
        } else if self.paused {
            WorkerPhase::Paused
        } else if self.blocked_on_downstream {
            WorkerPhase::Blocked
        } else {
            WorkerPhase::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_blocked() {
        let state = WorkerState::default();
        assert!(state.blocked_on_downstream());
        assert!(!state.paused());
        assert!(!state.terminated());
        assert!(!state.can_work());
        assert_eq!(state.phase(), WorkerPhase::Blocked);
    }

    #[test]
    fn test_phase_precedence() {
        let mut state = WorkerState::default();
        state.set_paused(true);
        assert_eq!(state.phase(), WorkerPhase::Paused);

        state.terminate();
        assert_eq!(state.phase(), WorkerPhase::Terminated);

        let mut state = WorkerState::default();
        state.set_blocked_on_downstream(false);
        assert!(state.can_work());
        assert_eq!(state.phase(), WorkerPhase::Running);
    }

    #[test]
    fn test_phase_terminal_and_idle_checks() {
        assert!(WorkerPhase::Terminated.is_terminal());
        assert!(!WorkerPhase::Running.is_terminal());
        assert!(WorkerPhase::Blocked.is_idle());
        assert!(WorkerPhase::Paused.is_idle());
        assert!(!WorkerPhase::Running.is_idle());
    }

    #[test]
    fn test_phase_string_conversion() {
        assert_eq!(WorkerPhase::Paused.to_string(), "paused");
        assert_eq!(
            "terminated".parse::<WorkerPhase>().unwrap(),
            WorkerPhase::Terminated
        );
        assert!("sleeping".parse::<WorkerPhase>().is_err());

        let json = serde_json::to_string(&WorkerPhase::Running).unwrap();
        assert_eq!(json, "\"running\"");
    }
}
