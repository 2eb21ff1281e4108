//! Event dispatch: the single place worker state changes in response to the
//! control plane.

use super::identity::IdentityTable;
use super::states::{WorkerPhase, WorkerState};
use crate::messaging::{ControlEvent, SignalKind};

/// Phase before and after one dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: WorkerPhase,
    pub to: WorkerPhase,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Apply one drained event to a worker's state and identity table
///
/// Total over [`ControlEvent`]: every variant has exactly one handler.
pub fn apply(
    event: &ControlEvent,
    state: &mut WorkerState,
    identities: &mut IdentityTable,
) -> Transition {
    let from = state.phase();

    match *event {
        ControlEvent::IdentityAnnouncement { role, address } => identities.resolve(role, address),
        ControlEvent::SignalPropagation { signal } => match signal {
            SignalKind::Terminate => state.terminate(),
            SignalKind::Pause => state.set_paused(true),
            SignalKind::Resume => state.set_paused(false),
        },
        ControlEvent::FlowToken { unblock } => state.set_blocked_on_downstream(!unblock),
    }

    Transition {
        from,
        to: state.phase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::WorkerAddress;
    use crate::worker::Role;

    fn fresh() -> (WorkerState, IdentityTable) {
        (WorkerState::default(), IdentityTable::new())
    }

    #[test]
    fn test_flow_token_toggles_blocked() {
        let (mut state, mut table) = fresh();

        let transition = apply(&ControlEvent::unblock(), &mut state, &mut table);
        assert_eq!(transition.from, WorkerPhase::Blocked);
        assert_eq!(transition.to, WorkerPhase::Running);
        assert!(transition.changed());

        apply(&ControlEvent::FlowToken { unblock: false }, &mut state, &mut table);
        assert!(state.blocked_on_downstream());
    }

    #[test]
    fn test_pause_twice_then_resume() {
        let (mut state, mut table) = fresh();
        let pause = ControlEvent::signal(SignalKind::Pause);

        apply(&pause, &mut state, &mut table);
        apply(&pause, &mut state, &mut table);
        assert!(state.paused());

        apply(&ControlEvent::signal(SignalKind::Resume), &mut state, &mut table);
        assert!(!state.paused());
    }

    #[test]
    fn test_terminate_is_monotonic() {
        let (mut state, mut table) = fresh();
        apply(&ControlEvent::signal(SignalKind::Terminate), &mut state, &mut table);

        let followers = [
            ControlEvent::signal(SignalKind::Resume),
            ControlEvent::signal(SignalKind::Pause),
            ControlEvent::unblock(),
            ControlEvent::announce(Role::Source, WorkerAddress::new()),
        ];
        for event in &followers {
            let transition = apply(event, &mut state, &mut table);
            assert!(state.terminated());
            assert_eq!(transition.to, WorkerPhase::Terminated);
        }
    }

    #[test]
    fn test_announcement_only_touches_identity_table() {
        let (mut state, mut table) = fresh();
        let address = WorkerAddress::new();

        let announcement = ControlEvent::announce(Role::Sink, address);
        let transition = apply(&announcement, &mut state, &mut table);
        assert!(!transition.changed());
        assert_eq!(table.get(Role::Sink), Some(address));
        assert_eq!(state, WorkerState::default());
    }
}
