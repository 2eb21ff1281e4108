//! # Control Port
//!
//! A worker's attachment to the control plane: its mailbox on the
//! [`ControlBus`], its identity table, its state flags, and the inbox for
//! user-facing signals.
//!
//! Two notification kinds reach a worker:
//!
//! - the mailbox wake signal, raised by every delivery, meaning "drain your
//!   mailbox";
//! - user signals (`Terminate`, `Pause`, `Resume`), which are never applied
//!   locally. The receiving worker broadcasts a `SignalPropagation` to all
//!   three workers, itself included, and applies it only when it drains its
//!   own copy like everyone else.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::role::Role;
use super::status::WorkerStatus;
use crate::logging::{log_control_event, log_worker_transition};
use crate::messaging::{ControlBus, ControlEvent, SignalKind, WakeSignal, WorkerAddress};
use crate::state_machine::{self, IdentityTable, WorkerState};

/// Why a wait returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// The mailbox wake signal was raised
    Notified,
    /// A user signal arrived and was broadcast
    UserSignal(SignalKind),
    /// The poll interval elapsed
    Elapsed,
}

pub struct ControlPort {
    role: Role,
    address: WorkerAddress,
    bus: Arc<ControlBus>,
    wake: WakeSignal,
    signals: mpsc::UnboundedReceiver<SignalKind>,
    identities: IdentityTable,
    state: WorkerState,
    status: watch::Sender<WorkerStatus>,
}

impl std::fmt::Debug for ControlPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPort")
            .field("role", &self.role)
            .field("address", &self.address)
            .field("bus_id", &self.bus.bus_id())
            .field("identities", &self.identities)
            .field("state", &self.state)
            .finish()
    }
}

impl ControlPort {
    pub fn new(
        role: Role,
        address: WorkerAddress,
        bus: Arc<ControlBus>,
        wake: WakeSignal,
        signals: mpsc::UnboundedReceiver<SignalKind>,
        status: watch::Sender<WorkerStatus>,
    ) -> Self {
        Self {
            role,
            address,
            bus,
            wake,
            signals,
            identities: IdentityTable::new(),
            state: WorkerState::default(),
            status,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn address(&self) -> WorkerAddress {
        self.address
    }

    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    pub fn identities(&self) -> &IdentityTable {
        &self.identities
    }

    /// Send `event` to `destination`, resolving its address from the identity table
    ///
    /// Returns `false` when the destination is unresolved or the bus refuses
    /// the event. The failure is logged and never retried.
    pub fn send(&self, destination: Role, event: ControlEvent) -> bool {
        let Some(address) = self.identities.get(destination) else {
            error!(
                role = %self.role,
                destination = %destination,
                event_type = event.event_type(),
                "Stale destination: address unresolved, event dropped"
            );
            return false;
        };

        match self.bus.deliver(address, event) {
            Ok(()) => {
                log_control_event("send", self.role, &event);
                true
            }
            Err(e) => {
                error!(
                    role = %self.role,
                    destination = %destination,
                    event_type = event.event_type(),
                    error = %e,
                    "Control event delivery refused"
                );
                false
            }
        }
    }

    /// Send `SignalPropagation(signal)` to every worker, this one included
    ///
    /// Returns how many deliveries were accepted.
    pub fn broadcast(&self, signal: SignalKind) -> usize {
        Role::ALL
            .into_iter()
            .filter(|destination| self.send(*destination, ControlEvent::signal(signal)))
            .count()
    }

    /// Drain the mailbox and dispatch every event in arrival order
    pub fn process_pending(&mut self) -> usize {
        let mut dispatched = 0;
        for event in self.bus.drain_all(self.address) {
            self.dispatch(&event);
            dispatched += 1;
        }

        if dispatched > 0 {
            let phase = self.state.phase();
            self.status.send_modify(|status| {
                status.phase = phase;
                status.events_dispatched += dispatched as u64;
            });
        }
        dispatched
    }

    fn dispatch(&mut self, event: &ControlEvent) {
        log_control_event("dispatch", self.role, event);

        if let ControlEvent::SignalPropagation { signal } = event {
            info!(role = %self.role, signal = %signal, "Received control signal");
        }

        let transition = state_machine::apply(event, &mut self.state, &mut self.identities);
        if transition.changed() {
            log_worker_transition(self.role, transition.from, transition.to);
        }
    }

    /// Block further production until the successor hands back an unblock token
    pub fn mark_produced(&mut self) {
        let from = self.state.phase();
        self.state.set_blocked_on_downstream(true);
        let to = self.state.phase();
        if from != to {
            log_worker_transition(self.role, from, to);
        }

        self.status.send_modify(|status| {
            status.phase = to;
            status.items_processed += 1;
        });
    }

    /// Wait for the next notification, or until `interval` elapses
    ///
    /// `None` waits for a notification only.
    pub async fn wait(&mut self, interval: Option<Duration>) -> Wakeup {
        let sleep = tokio::time::sleep(interval.unwrap_or_default());

        tokio::select! {
            _ = self.wake.notified() => Wakeup::Notified,
            Some(signal) = self.signals.recv() => {
                self.relay_user_signal(signal);
                Wakeup::UserSignal(signal)
            }
            _ = sleep, if interval.is_some() => Wakeup::Elapsed,
        }
    }

    fn relay_user_signal(&self, signal: SignalKind) {
        info!(role = %self.role, signal = %signal, "User signal received, broadcasting");

        let delivered = self.broadcast(signal);
        if delivered < Role::COUNT {
            warn!(
                role = %self.role,
                signal = %signal,
                delivered = delivered,
                "Signal broadcast reached only part of the pipeline"
            );
        }
    }

    /// Wait on the mailbox wake signal only; user signals stay queued in the inbox
    async fn wait_for_mailbox(&self, interval: Duration) -> Wakeup {
        tokio::select! {
            _ = self.wake.notified() => Wakeup::Notified,
            _ = tokio::time::sleep(interval) => Wakeup::Elapsed,
        }
    }

    /// Startup barrier: poll until every role's address is known
    ///
    /// No timeout: the orchestrator is responsible for eventually announcing
    /// every identity. User signals raised meanwhile are relayed by the main
    /// loop once the barrier has passed, since nothing can be sent before.
    pub async fn await_identities(&mut self, interval: Duration) {
        loop {
            self.process_pending();
            if self.identities.is_complete() {
                break;
            }

            debug!(
                role = %self.role,
                unresolved = ?self.identities.unresolved(),
                "Waiting for peer identities"
            );
            self.wait_for_mailbox(interval).await;
        }

        info!(role = %self.role, address = %self.address, "All peer identities resolved");
        self.status.send_modify(|status| status.identities_resolved = true);
    }

    /// Publish the final phase once the main loop has exited
    pub fn finish(&mut self) -> WorkerStatus {
        let phase = self.state.phase();
        self.status.send_modify(|status| status.phase = phase);
        self.status.borrow().clone()
    }
}
