//! # Control Bus
//!
//! Process-wide, per-destination addressed mailbox for [`ControlEvent`]s.
//!
//! ```text
//! any worker ──deliver(addr, event)──→ Mailbox[addr] ──drain_all(addr)──→ owner
//!                                         │
//!                                         └─ wake.notify_one()  (NotificationSignal)
//! ```
//!
//! - Any number of concurrent senders; each mailbox has a single consumer.
//! - Events to the same destination are drained in send order.
//! - Draining never blocks; an empty mailbox yields an empty iterator.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{debug, info, trace};
use uuid::Uuid;

use super::errors::{BusError, BusResult};
use super::events::ControlEvent;

/// Opaque, addressable handle of a worker on the control bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerAddress(Uuid);

impl WorkerAddress {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkerAddress {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wake-up handle raised on every delivery to a mailbox
///
/// Backed by [`Notify`]: a notification raised while the owner is busy is
/// kept as a permit, so a wake-up is never lost between two waits.
pub type WakeSignal = Arc<Notify>;

#[derive(Debug, Default)]
struct Mailbox {
    queue: Mutex<VecDeque<ControlEvent>>,
    wake: WakeSignal,
}

/// Shared control-plane delivery structure
#[derive(Debug)]
pub struct ControlBus {
    bus_id: Uuid,
    mailboxes: DashMap<WorkerAddress, Arc<Mailbox>>,
    closed: AtomicBool,
}

impl ControlBus {
    pub fn new() -> Self {
        let bus_id = Uuid::new_v4();
        info!(bus_id = %bus_id, "Creating ControlBus");

        Self {
            bus_id,
            mailboxes: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn bus_id(&self) -> Uuid {
        self.bus_id
    }

    /// Create the mailbox for `address` and return its wake signal
    ///
    /// Registering an address twice returns the existing wake signal.
    pub fn register(&self, address: WorkerAddress) -> BusResult<WakeSignal> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let mailbox = self.mailboxes.entry(address).or_default();
        debug!(bus_id = %self.bus_id, address = %address, "Registered mailbox");
        Ok(mailbox.wake.clone())
    }

    /// Remove the mailbox for `address`, discarding anything still queued
    pub fn deregister(&self, address: WorkerAddress) {
        if let Some((_, mailbox)) = self.mailboxes.remove(&address) {
            let discarded = mailbox.queue.lock().len();
            debug!(
                bus_id = %self.bus_id,
                address = %address,
                discarded = discarded,
                "Deregistered mailbox"
            );
        }
    }

    /// Enqueue `event` for `destination` and raise its wake signal
    pub fn deliver(&self, destination: WorkerAddress, event: ControlEvent) -> BusResult<()> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let mailbox = self
            .mailboxes
            .get(&destination)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BusError::unknown_destination(destination))?;

        mailbox.queue.lock().push_back(event);
        mailbox.wake.notify_one();

        trace!(
            destination = %destination,
            event_type = event.event_type(),
            "Delivered control event"
        );
        Ok(())
    }

    /// Take every event currently queued for `owner`
    ///
    /// The returned iterator is lazy and bounded by the queue length at the
    /// time of the call; events delivered meanwhile stay for the next drain.
    pub fn drain_all(&self, owner: WorkerAddress) -> Drain {
        let mailbox = self
            .mailboxes
            .get(&owner)
            .map(|entry| Arc::clone(entry.value()));
        let remaining = mailbox.as_ref().map_or(0, |m| m.queue.lock().len());

        Drain { mailbox, remaining }
    }

    /// Number of events waiting for `address`
    pub fn pending(&self, address: WorkerAddress) -> usize {
        self.mailboxes
            .get(&address)
            .map_or(0, |entry| entry.value().queue.lock().len())
    }

    /// Close the bus and drop every mailbox. Closing twice is a no-op.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        // Waiters are woken so they can observe the closed bus at their next check
        for entry in self.mailboxes.iter() {
            entry.value().wake.notify_one();
        }
        self.mailboxes.clear();
        info!(bus_id = %self.bus_id, "ControlBus closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for ControlBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy, finite sequence of drained events
#[derive(Debug)]
pub struct Drain {
    mailbox: Option<Arc<Mailbox>>,
    remaining: usize,
}

impl Iterator for Drain {
    type Item = ControlEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let event = self.mailbox.as_ref()?.queue.lock().pop_front();
        self.remaining = if event.is_some() { self.remaining - 1 } else { 0 };
        event
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
