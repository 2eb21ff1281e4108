//! # Messaging Module
//!
//! Control-plane messaging: the event model, the addressed control bus, and
//! its error types.

pub mod bus;
pub mod errors;
pub mod events;

pub use bus::{ControlBus, Drain, WakeSignal, WorkerAddress};
pub use errors::{BusError, BusResult};
pub use events::{ControlEvent, SignalKind};
